//! Retrying HTTP clients and the pool that shares them between providers.

mod client;
mod pool;

pub use client::create_retryable_http_client;
pub use pool::{HttpClientPool, HttpClientPoolError};
