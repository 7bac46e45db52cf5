use std::sync::Arc;

use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;

use crate::{config::HttpRetryConfig, http_client::create_retryable_http_client};

/// Creates an HTTP client that never retries, so failure tests stay fast.
pub fn create_test_http_client() -> Arc<ClientWithMiddleware> {
    Arc::new(create_retryable_http_client(&HttpRetryConfig::no_retries(), Client::new()))
}
