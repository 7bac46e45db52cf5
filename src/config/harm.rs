//! Tunables of the harmful-message monitor.
//!
//! Every field is parsed leniently: a value that cannot be understood is
//! logged and replaced by its default, so a typo in this section never keeps
//! the service from starting.

use std::{str::FromStr, time::Duration};

use serde::Deserialize;

use super::helpers::{deserialize_keyword_list, deserialize_lenient, deserialize_lenient_seconds};
use crate::models::{ClassificationMode, Severity};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1200);
const DEFAULT_MAX_BURST: Duration = Duration::from_secs(8);
const DEFAULT_MAX_COMBINED_CHARS: usize = 500;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(600);
const DEFAULT_CONTEXT_CAPACITY: usize = 50;
const DEFAULT_CONTEXT_LINES: usize = 15;
const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra keywords appended to the built-in lexicons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtraKeywords {
    /// English keywords or phrases.
    #[serde(default, deserialize_with = "deserialize_keyword_list")]
    pub en: Vec<String>,
    /// Arabic keywords.
    #[serde(default, deserialize_with = "deserialize_keyword_list")]
    pub ar: Vec<String>,
}

/// A boolean switch that also accepts the usual spellings found in
/// environment variables.
#[derive(Debug, Clone, Copy)]
struct Switch(bool);

impl FromStr for Switch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Switch(true)),
            "0" | "false" | "no" | "off" => Ok(Switch(false)),
            other => Err(format!("'{other}' is not a boolean")),
        }
    }
}

/// The section as written by the operator, before defaults are applied.
#[derive(Debug, Default, Deserialize)]
struct RawHarmConfig {
    #[serde(default, deserialize_with = "deserialize_lenient_seconds")]
    debounce_secs: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_lenient_seconds")]
    max_burst_secs: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    max_combined_chars: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    cooldown_secs: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    mode: Option<ClassificationMode>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    min_severity: Option<Severity>,
    #[serde(default)]
    extra_keywords: ExtraKeywords,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    arabic_dialect: Option<Switch>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    context_capacity: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    context_lines: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_lenient_seconds")]
    classifier_timeout_secs: Option<Duration>,
}

/// Drops zero, which none of the count settings accept.
fn positive(name: &str, value: Option<usize>) -> Option<usize> {
    match value {
        Some(0) => {
            tracing::warn!(setting = name, "Setting must be positive, using default.");
            None
        }
        other => other,
    }
}

/// Resolved configuration of the burst monitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawHarmConfig")]
pub struct HarmConfig {
    /// Quiet period after which a burst is finalized.
    pub debounce_interval: Duration,
    /// Hard ceiling on a burst's duration, measured from its first message.
    pub max_burst_duration: Duration,
    /// Cap on the characters buffered per burst, separators included.
    pub max_combined_chars: usize,
    /// Minimum spacing between two coaching messages to the same user.
    pub cooldown_interval: Duration,
    /// Which detectors the classification gate consults.
    pub mode: ClassificationMode,
    /// Lowest severity that triggers a coaching message.
    pub min_severity: Severity,
    /// Operator-supplied keywords.
    pub extra_keywords: ExtraKeywords,
    /// Whether the Arabic dialect stage of the heuristic runs.
    pub arabic_dialect: bool,
    /// Lines kept per conversation in the context window.
    pub context_capacity: usize,
    /// Lines of context handed to the classifier.
    pub context_lines: usize,
    /// Upper bound for one remote classification call.
    pub classifier_timeout: Duration,
}

impl From<RawHarmConfig> for HarmConfig {
    fn from(raw: RawHarmConfig) -> Self {
        Self {
            debounce_interval: raw.debounce_secs.unwrap_or(DEFAULT_DEBOUNCE),
            max_burst_duration: raw.max_burst_secs.unwrap_or(DEFAULT_MAX_BURST),
            max_combined_chars: positive("max_combined_chars", raw.max_combined_chars)
                .unwrap_or(DEFAULT_MAX_COMBINED_CHARS),
            cooldown_interval: raw.cooldown_secs.map(Duration::from_secs).unwrap_or(DEFAULT_COOLDOWN),
            mode: raw.mode.unwrap_or_default(),
            min_severity: raw.min_severity.unwrap_or(Severity::Medium),
            extra_keywords: raw.extra_keywords,
            arabic_dialect: raw.arabic_dialect.map(|Switch(on)| on).unwrap_or(true),
            context_capacity: positive("context_capacity", raw.context_capacity)
                .unwrap_or(DEFAULT_CONTEXT_CAPACITY),
            context_lines: positive("context_lines", raw.context_lines)
                .unwrap_or(DEFAULT_CONTEXT_LINES),
            classifier_timeout: raw.classifier_timeout_secs.unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT),
        }
    }
}

impl Default for HarmConfig {
    fn default() -> Self {
        RawHarmConfig::default().into()
    }
}
