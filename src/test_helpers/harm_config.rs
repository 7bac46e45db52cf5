//! A builder for creating `HarmConfig` instances in tests.

use std::time::Duration;

use crate::{
    config::HarmConfig,
    models::{ClassificationMode, Severity},
};

/// A builder for creating `HarmConfig` instances in tests.
///
/// Starts from the production defaults.
#[derive(Debug, Clone, Default)]
pub struct HarmConfigBuilder {
    config: HarmConfig,
}

impl HarmConfigBuilder {
    /// Creates a new `HarmConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quiet period that ends a burst.
    pub fn debounce(mut self, interval: Duration) -> Self {
        self.config.debounce_interval = interval;
        self
    }

    /// Sets the hard cap on a burst's duration.
    pub fn max_burst(mut self, duration: Duration) -> Self {
        self.config.max_burst_duration = duration;
        self
    }

    /// Sets the maximum combined characters per burst.
    pub fn max_chars(mut self, chars: usize) -> Self {
        self.config.max_combined_chars = chars;
        self
    }

    /// Sets the per-user cooldown.
    pub fn cooldown(mut self, interval: Duration) -> Self {
        self.config.cooldown_interval = interval;
        self
    }

    /// Sets the classification mode.
    pub fn mode(mut self, mode: ClassificationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets the minimum qualifying severity.
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.config.min_severity = severity;
        self
    }

    /// Adds English keywords to the lexicon.
    pub fn extra_english(mut self, keywords: &[&str]) -> Self {
        self.config.extra_keywords.en.extend(keywords.iter().map(|k| k.to_string()));
        self
    }

    /// Adds Arabic keywords to the lexicon.
    pub fn extra_arabic(mut self, keywords: &[&str]) -> Self {
        self.config.extra_keywords.ar.extend(keywords.iter().map(|k| k.to_string()));
        self
    }

    /// Enables or disables the Arabic stage.
    pub fn arabic_dialect(mut self, enabled: bool) -> Self {
        self.config.arabic_dialect = enabled;
        self
    }

    /// Sets how many context lines accompany a classification.
    pub fn context_lines(mut self, lines: usize) -> Self {
        self.config.context_lines = lines;
        self
    }

    /// Sets the remote classifier timeout.
    pub fn classifier_timeout(mut self, timeout: Duration) -> Self {
        self.config.classifier_timeout = timeout;
        self
    }

    /// Builds the `HarmConfig`.
    pub fn build(self) -> HarmConfig {
        self.config
    }
}
