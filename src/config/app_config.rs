use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::{BaseHttpClientConfig, HarmConfig, HttpRetryConfig, deserialize_duration_from_seconds};
use crate::models::notifier::{AzureOpenAiConfig, NotifierTypeConfig};

/// Provides the default value for shutdown_timeout.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Provides the default value for burst_channel_capacity.
fn default_burst_channel_capacity() -> usize {
    1024
}

/// Provides the default value for cooldown_sweep_interval.
fn default_cooldown_sweep_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_require_consent() -> bool {
    true
}

/// Application configuration for pulsewatch.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Burst, classification and cooldown tunables.
    #[serde(default)]
    pub harm: HarmConfig,

    /// The service's own user id. Messages from it are never monitored.
    #[serde(default)]
    pub self_user_id: Option<u64>,

    /// Remote classifier and responder. Without it the gate runs on the
    /// heuristic alone and tips come from the canned responder.
    #[serde(default)]
    pub azure: Option<AzureOpenAiConfig>,

    /// Where coaching messages are delivered.
    #[serde(default)]
    pub notifier: NotifierTypeConfig,

    /// Whether only users listed in the consent file are monitored.
    #[serde(default = "default_require_consent")]
    pub require_consent: bool,

    /// Path to the consent list, resolved against the config directory.
    #[serde(skip_deserializing)]
    pub consent_config_path: PathBuf,

    /// Configuration for HTTP client retry policies.
    #[serde(default)]
    pub http_retry_config: HttpRetryConfig,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,

    /// The capacity of the channel carrying finalized bursts.
    #[serde(default = "default_burst_channel_capacity")]
    pub burst_channel_capacity: usize,

    /// How often expired cooldown records are swept.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_cooldown_sweep_interval"
    )]
    pub cooldown_sweep_interval: Duration,

    /// The maximum time in seconds to wait for graceful shutdown.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_shutdown_timeout"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            harm: HarmConfig::default(),
            self_user_id: None,
            azure: None,
            notifier: NotifierTypeConfig::default(),
            require_consent: default_require_consent(),
            consent_config_path: PathBuf::from("configs/consent.yaml"),
            http_retry_config: HttpRetryConfig::default(),
            http_base_config: BaseHttpClientConfig::default(),
            burst_channel_capacity: default_burst_channel_capacity(),
            cooldown_sweep_interval: default_cooldown_sweep_interval(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, with `PULSEWATCH__*` environment variables layered on top.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("PULSEWATCH").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        config.consent_config_path = Path::new(config_dir_str).join("consent.yaml");

        Ok(config)
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn harm(mut self, harm: HarmConfig) -> Self {
        self.config.harm = harm;
        self
    }

    pub fn self_user_id(mut self, id: u64) -> Self {
        self.config.self_user_id = Some(id);
        self
    }

    pub fn require_consent(mut self, required: bool) -> Self {
        self.config.require_consent = required;
        self
    }

    pub fn consent_config_path(mut self, path: &str) -> Self {
        self.config.consent_config_path = path.into();
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
