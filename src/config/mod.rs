//! Configuration module for pulsewatch.

mod app_config;
mod harm;
mod helpers;
mod http_base;
mod http_retry;
mod loader;

pub use app_config::AppConfig;
pub use harm::{ExtraKeywords, HarmConfig};
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, deserialize_keyword_list,
    deserialize_lenient, deserialize_lenient_seconds, serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use loader::{ConfigLoader, LoaderError};
