//! In-process counters for the monitoring pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every stage of the pipeline.
#[derive(Debug)]
pub struct PipelineMetrics {
    start_time: tokio::time::Instant,
    messages_ingested: AtomicU64,
    bursts_finalized: AtomicU64,
    bursts_dropped_empty: AtomicU64,
    classifier_fallbacks: AtomicU64,
    verdicts_harmful: AtomicU64,
    verdicts_qualifying: AtomicU64,
    cooldown_suppressed: AtomicU64,
    deliveries_succeeded: AtomicU64,
    deliveries_failed: AtomicU64,
}

/// A point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Seconds since the counters were created.
    pub uptime_secs: u64,
    /// Non-blank messages handed to the aggregator.
    pub messages_ingested: u64,
    /// Bursts sent to the orchestrator.
    pub bursts_finalized: u64,
    /// Bursts discarded because their text was blank.
    pub bursts_dropped_empty: u64,
    /// Remote classifications replaced by the conservative verdict.
    pub classifier_fallbacks: u64,
    /// Verdicts that flagged the text as harmful.
    pub verdicts_harmful: u64,
    /// Harmful verdicts that met the severity policy.
    pub verdicts_qualifying: u64,
    /// Coaching messages skipped because of the cooldown.
    pub cooldown_suppressed: u64,
    /// Coaching messages delivered.
    pub deliveries_succeeded: u64,
    /// Coaching messages the notifier failed to deliver.
    pub deliveries_failed: u64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[doc = concat!("Increments `", stringify!($field), "`.")]
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl PipelineMetrics {
    counter! {
        record_message_ingested => messages_ingested,
        record_burst_finalized => bursts_finalized,
        record_burst_dropped_empty => bursts_dropped_empty,
        record_classifier_fallback => classifier_fallbacks,
        record_verdict_harmful => verdicts_harmful,
        record_verdict_qualifying => verdicts_qualifying,
        record_cooldown_suppressed => cooldown_suppressed,
        record_delivery_succeeded => deliveries_succeeded,
        record_delivery_failed => deliveries_failed,
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            messages_ingested: self.messages_ingested.load(Ordering::Relaxed),
            bursts_finalized: self.bursts_finalized.load(Ordering::Relaxed),
            bursts_dropped_empty: self.bursts_dropped_empty.load(Ordering::Relaxed),
            classifier_fallbacks: self.classifier_fallbacks.load(Ordering::Relaxed),
            verdicts_harmful: self.verdicts_harmful.load(Ordering::Relaxed),
            verdicts_qualifying: self.verdicts_qualifying.load(Ordering::Relaxed),
            cooldown_suppressed: self.cooldown_suppressed.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            start_time: tokio::time::Instant::now(),
            messages_ingested: AtomicU64::new(0),
            bursts_finalized: AtomicU64::new(0),
            bursts_dropped_empty: AtomicU64::new(0),
            classifier_fallbacks: AtomicU64::new(0),
            verdicts_harmful: AtomicU64::new(0),
            verdicts_qualifying: AtomicU64::new(0),
            cooldown_suppressed: AtomicU64::new(0),
            deliveries_succeeded: AtomicU64::new(0),
            deliveries_failed: AtomicU64::new(0),
        }
    }
}
