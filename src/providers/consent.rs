//! Consent oracles.

use std::{collections::HashSet, path::Path};

use async_trait::async_trait;

use super::traits::ConsentOracle;
use crate::config::{ConfigLoader, LoaderError};

/// Key of the user id list inside the consent file.
pub const CONSENT_KEY: &str = "consented_users";

/// Users who opted in, loaded once from a YAML file:
///
/// ```yaml
/// consented_users:
///   - 123456789
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsentList {
    users: HashSet<u64>,
}

impl ConsentList {
    /// Creates a list from the given ids.
    pub fn new(users: impl IntoIterator<Item = u64>) -> Self {
        Self { users: users.into_iter().collect() }
    }

    /// Loads the list from `path`.
    pub fn from_file(path: &Path) -> Result<Self, LoaderError> {
        let users: Vec<u64> = ConfigLoader::new(path.to_path_buf()).load(CONSENT_KEY)?;
        tracing::info!(path = %path.display(), users = users.len(), "Loaded consent list.");
        Ok(Self::new(users))
    }

    /// Number of consented users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether nobody consented.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl ConsentOracle for ConsentList {
    async fn is_consented(&self, user_id: u64) -> bool {
        self.users.contains(&user_id)
    }
}

/// Treats every user as consented. For development only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl ConsentOracle for AllowAll {
    async fn is_consented(&self, _user_id: u64) -> bool {
        true
    }
}
