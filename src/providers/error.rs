//! Errors shared by the HTTP-backed providers.

use reqwest::StatusCode;
use thiserror::Error;

use crate::http_client::HttpClientPoolError;

/// A failure talking to a remote provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request could not be sent or the connection failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// The response body could not be read.
    #[error("Failed to read response: {0}")]
    Body(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Provider returned status {status}: {body}")]
    Status {
        /// The HTTP status.
        status: StatusCode,
        /// The (possibly truncated) response body.
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No HTTP client could be obtained.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),
}
