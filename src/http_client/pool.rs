//! A shared, thread-safe pool of HTTP clients.
//!
//! Every outbound integration (the Azure classifier and responder, the
//! webhook notifier) asks the pool for a client with its own retry policy.
//! Clients are keyed by that policy and share one set of base settings.

use std::{collections::HashMap, sync::Arc};

use reqwest::Client as ReqwestClient;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tokio::sync::RwLock;

use super::client::create_retryable_http_client;
use crate::config::{BaseHttpClientConfig, HttpRetryConfig};

/// Errors that can occur within the `HttpClientPool`.
#[derive(Debug, Error)]
pub enum HttpClientPoolError {
    /// An error occurred while building the underlying `reqwest::Client`.
    #[error("Failed to create HTTP client: {0}")]
    HttpClientBuildError(String),
}

/// Pool of retrying HTTP clients, one per distinct [`HttpRetryConfig`].
pub struct HttpClientPool {
    base_config: BaseHttpClientConfig,
    clients: Arc<RwLock<HashMap<HttpRetryConfig, Arc<ClientWithMiddleware>>>>,
}

impl HttpClientPool {
    /// Creates an empty pool whose clients are built from `base_config`.
    pub fn new(base_config: BaseHttpClientConfig) -> Self {
        Self { base_config, clients: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Returns the client for `retry_policy`, creating it on first use.
    ///
    /// Read lock first, then a double-checked write lock, so at most one
    /// client is ever built per policy.
    pub async fn get_or_create(
        &self,
        retry_policy: &HttpRetryConfig,
    ) -> Result<Arc<ClientWithMiddleware>, HttpClientPoolError> {
        if let Some(client) = self.clients.read().await.get(retry_policy) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(retry_policy) {
            return Ok(client.clone());
        }

        let base_client = ReqwestClient::builder()
            .pool_max_idle_per_host(self.base_config.max_idle_per_host)
            .pool_idle_timeout(Some(self.base_config.idle_timeout))
            .connect_timeout(self.base_config.connect_timeout)
            .timeout(self.base_config.request_timeout)
            .build()
            .map_err(|e| HttpClientPoolError::HttpClientBuildError(e.to_string()))?;

        let new_client = Arc::new(create_retryable_http_client(retry_policy, base_client));
        clients.insert(retry_policy.clone(), new_client.clone());
        tracing::debug!(?retry_policy, "Created HTTP client.");

        Ok(new_client)
    }

    /// Number of clients built so far.
    #[cfg(test)]
    pub async fn get_active_client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for HttpClientPool {
    fn default() -> Self {
        Self::new(BaseHttpClientConfig::default())
    }
}
