//! Generic loader for lists kept in their own YAML file.

use std::{fs, path::PathBuf};

use config::{Config, File, FileFormat};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Loads a list of items stored under a top-level key of a YAML file.
pub struct ConfigLoader {
    path: PathBuf,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// The file extension is not a supported format.
    #[error("Unsupported configuration format")]
    UnsupportedFormat,
}

impl ConfigLoader {
    /// Creates a new `ConfigLoader`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the list under `key` (e.g. `"consented_users"`).
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, LoaderError> {
        if !self.is_yaml_file() {
            return Err(LoaderError::UnsupportedFormat);
        }

        let config_str = fs::read_to_string(&self.path)?;

        let config = Config::builder()
            .add_source(File::from_str(&config_str, FileFormat::Yaml))
            .build()?;

        Ok(config.get(key)?)
    }

    /// The file this loader reads.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn is_yaml_file(&self) -> bool {
        matches!(
            self.path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
        let path = dir.path().join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_user_ids() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "consent.yaml", "consented_users:\n  - 11\n  - 22\n");
        let ids: Vec<u64> = ConfigLoader::new(path).load("consented_users").unwrap();
        assert_eq!(ids, vec![11, 22]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(dir.path().join("missing.yaml"));
        let result: Result<Vec<u64>, _> = loader.load("consented_users");
        assert!(matches!(result.unwrap_err(), LoaderError::IoError(_)));
    }

    #[test]
    fn test_load_invalid_yaml_syntax() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.yaml", "consented_users: [1, 2");
        let result: Result<Vec<u64>, _> = ConfigLoader::new(path).load("consented_users");
        assert!(matches!(result.unwrap_err(), LoaderError::ParseError(_)));
    }

    #[test]
    fn test_load_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "consent.txt", "consented_users: []");
        let result: Result<Vec<u64>, _> = ConfigLoader::new(path).load("consented_users");
        assert!(matches!(result.unwrap_err(), LoaderError::UnsupportedFormat));
    }

    #[test]
    fn test_load_missing_top_level_key() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "consent.yaml", "users:\n  - 1\n");
        let result: Result<Vec<u64>, _> = ConfigLoader::new(path).load("consented_users");
        assert!(matches!(result.unwrap_err(), LoaderError::ParseError(_)));
    }
}
