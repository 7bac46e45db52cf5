use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{deserialize_duration_from_ms, deserialize_duration_from_seconds};

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(250)
}

fn default_max_backoff() -> Duration {
    Duration::from_secs(10)
}

fn default_base_for_backoff() -> u32 {
    2
}

/// Jitter applied to the retry backoff.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
    /// Deterministic backoff.
    None,
    /// Randomize the whole backoff window.
    #[default]
    Full,
}

/// Retry policy for outbound HTTP calls (classifier, responder, webhook).
///
/// Used as the key of the `HttpClientPool`, so two providers with the same
/// policy share one connection pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct HttpRetryConfig {
    /// Maximum number of retries for transient errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base of the exponential backoff.
    #[serde(default = "default_base_for_backoff")]
    pub base_for_backoff: u32,
    /// Backoff before the first retry.
    #[serde(default = "default_initial_backoff", deserialize_with = "deserialize_duration_from_ms")]
    pub initial_backoff_ms: Duration,
    /// Upper bound for a single backoff.
    #[serde(default = "default_max_backoff", deserialize_with = "deserialize_duration_from_seconds")]
    pub max_backoff_secs: Duration,
    /// Jitter to apply to the backoff.
    #[serde(default)]
    pub jitter: JitterSetting,
}

impl HttpRetryConfig {
    /// A policy that never retries. Handy where the caller already bounds the
    /// total time of a request.
    pub fn no_retries() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }
}

impl Default for HttpRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_for_backoff: default_base_for_backoff(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            jitter: JitterSetting::default(),
        }
    }
}
