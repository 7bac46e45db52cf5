//! Finalized bursts and why they were closed.

use std::fmt;

use tokio::time::Instant;

use super::message::BurstKey;

/// Why a burst was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    /// No new message arrived within the debounce interval.
    QuietPeriod,
    /// The burst reached its maximum duration.
    HardCap,
    /// The aggregator was flushed (shutdown).
    Flush,
}

impl fmt::Display for FinalizeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FinalizeReason::QuietPeriod => "quiet_period",
            FinalizeReason::HardCap => "hard_cap",
            FinalizeReason::Flush => "flush",
        })
    }
}

/// A closed burst, handed from the aggregator to the delivery orchestrator.
#[derive(Debug, Clone)]
pub struct FinalizedBurst {
    /// Who wrote the burst and where.
    pub key: BurstKey,
    /// The combined, trimmed and length-capped text. Never empty.
    pub text: String,
    /// How many messages contributed text before the character cap was reached.
    pub part_count: usize,
    /// When the first message of the burst arrived.
    pub first_seen_at: Instant,
    /// When the burst was closed.
    pub finalized_at: Instant,
    /// Which trigger closed the burst.
    pub reason: FinalizeReason,
}
