//! Classification outcome types shared by the gate, the providers and the
//! configuration layer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language code used when the language of a text could not be determined.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Error returned when a severity or mode string is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised {kind}: '{value}'")]
pub struct ParseLevelError {
    kind: &'static str,
    value: String,
}

/// How severe a harmful verdict is. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Mild tone problems.
    #[default]
    Low,
    /// Clearly aggressive or insulting.
    Medium,
    /// Threatening or abusive.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        })
    }
}

impl FromStr for Severity {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(ParseLevelError { kind: "severity", value: s.to_string() }),
        }
    }
}

/// Which detectors the classification gate consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMode {
    /// Only the remote classifier; failures degrade to a non-harmful verdict.
    #[serde(alias = "azure", alias = "remote")]
    RemoteOnly,
    /// Only the local keyword/pattern heuristic.
    #[serde(alias = "heuristic")]
    HeuristicOnly,
    /// Remote classifier first, heuristic when the remote did not flag the text.
    #[default]
    Hybrid,
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassificationMode::RemoteOnly => "remote-only",
            ClassificationMode::HeuristicOnly => "heuristic-only",
            ClassificationMode::Hybrid => "hybrid",
        })
    }
}

impl FromStr for ClassificationMode {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote-only" | "remote" | "azure" => Ok(ClassificationMode::RemoteOnly),
            "heuristic-only" | "heuristic" => Ok(ClassificationMode::HeuristicOnly),
            "hybrid" => Ok(ClassificationMode::Hybrid),
            _ => Err(ParseLevelError { kind: "classification mode", value: s.to_string() }),
        }
    }
}

/// The classification outcome for one finalized burst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the text was judged harmful.
    pub is_harmful: bool,
    /// Severity of the harm. Meaningless when `is_harmful` is false.
    pub severity: Severity,
    /// ISO language code of the text, `und` when unknown.
    pub language: String,
    /// Short free-form justification.
    pub reason: String,
}

impl Verdict {
    /// The verdict used whenever the remote classifier cannot answer.
    pub fn conservative() -> Self {
        Self {
            is_harmful: false,
            severity: Severity::Low,
            language: UNDETERMINED_LANGUAGE.to_string(),
            reason: "fallback".to_string(),
        }
    }

    /// The verdict reported for a positive heuristic hit.
    pub fn keyword_hit() -> Self {
        Self {
            is_harmful: true,
            severity: Severity::Medium,
            language: UNDETERMINED_LANGUAGE.to_string(),
            reason: "keyword".to_string(),
        }
    }

    /// The verdict reported when the heuristic found nothing.
    pub fn heuristic_miss() -> Self {
        Self {
            is_harmful: false,
            severity: Severity::Low,
            language: UNDETERMINED_LANGUAGE.to_string(),
            reason: "heuristic".to_string(),
        }
    }
}
