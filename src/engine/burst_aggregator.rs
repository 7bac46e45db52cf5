//! Merges an author's rapid-fire messages into bursts.
//!
//! Each live burst owns one background task that waits for whichever comes
//! first: the quiet period after the latest message, or the hard cap measured
//! from the first one. Ingesting a message only touches the live set and
//! nudges that task through a `watch` channel, so it never waits on a timer.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use tokio::{
    runtime::{Handle, TryCurrentError},
    sync::{mpsc, watch},
    time::{Instant, sleep_until},
};

use super::text::truncate_chars;
use crate::{
    config::HarmConfig,
    metrics::PipelineMetrics,
    models::{BurstKey, FinalizeReason, FinalizedBurst},
};

/// Errors raised while constructing the aggregator.
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// The aggregator spawns its timers on the current tokio runtime.
    #[error("Burst aggregator must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

/// A burst that is still accepting messages.
struct LiveBurst {
    generation: u64,
    first_seen_at: Instant,
    parts: Vec<String>,
    /// Characters buffered so far, separators included.
    chars: usize,
    rearm: watch::Sender<Instant>,
}

impl LiveBurst {
    /// Appends as much of `text` as fits under `max_chars`. Returns `false`
    /// once the burst is full and nothing was appended.
    fn append(&mut self, text: &str, max_chars: usize) -> bool {
        let separator = usize::from(!self.parts.is_empty());
        let room = max_chars.saturating_sub(self.chars + separator);
        if room == 0 {
            return false;
        }
        let part = truncate_chars(text, room);
        self.chars += separator + part.chars().count();
        self.parts.push(part.to_string());
        true
    }
}

/// State shared between the aggregator and its finalize tasks.
struct Shared {
    live: DashMap<BurstKey, LiveBurst>,
    debounce_interval: Duration,
    max_burst_duration: Duration,
    max_combined_chars: usize,
    output: mpsc::Sender<FinalizedBurst>,
    metrics: Arc<PipelineMetrics>,
}

/// Accumulates messages per [`BurstKey`] and emits [`FinalizedBurst`]s on a
/// bounded channel.
pub struct BurstAggregator {
    shared: Arc<Shared>,
    next_generation: AtomicU64,
    runtime: Handle,
}

impl BurstAggregator {
    /// Creates an aggregator that sends finalized bursts to `output`.
    pub fn new(
        config: &HarmConfig,
        output: mpsc::Sender<FinalizedBurst>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, AggregatorError> {
        let runtime = Handle::try_current()?;
        Ok(Self {
            shared: Arc::new(Shared {
                live: DashMap::new(),
                debounce_interval: config.debounce_interval,
                max_burst_duration: config.max_burst_duration,
                max_combined_chars: config.max_combined_chars,
                output,
                metrics,
            }),
            next_generation: AtomicU64::new(0),
            runtime,
        })
    }

    /// Adds `text` to the live burst for `key`, opening a new burst when none
    /// is live. Returns immediately.
    ///
    /// The buffer never holds more than `max_combined_chars` characters: text
    /// that would push the running total past it is truncated, and once the
    /// burst is full further messages only re-arm the quiet period.
    pub fn ingest(&self, key: BurstKey, text: &str, now: Instant) {
        let max_chars = self.shared.max_combined_chars;

        let opened = match self.shared.live.entry(key) {
            Entry::Occupied(mut entry) => {
                let burst = entry.get_mut();
                if burst.append(text, max_chars) {
                    tracing::trace!(burst = %key, parts = burst.parts.len(), "Extended live burst.");
                } else {
                    tracing::trace!(burst = %key, "Live burst is full, message not buffered.");
                }
                burst.rearm.send_replace(now);
                None
            }
            Entry::Vacant(entry) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let (rearm, rearm_rx) = watch::channel(now);
                let mut burst =
                    LiveBurst { generation, first_seen_at: now, parts: Vec::new(), chars: 0, rearm };
                burst.append(text, max_chars);
                entry.insert(burst);
                Some((generation, rearm_rx))
            }
        };

        if let Some((generation, rearm_rx)) = opened {
            tracing::debug!(burst = %key, generation, "Opened new burst.");
            let shared = Arc::clone(&self.shared);
            self.runtime.spawn(async move {
                shared.finalize_when_due(key, generation, now, rearm_rx).await;
            });
        }
    }

    /// Finalizes every live burst immediately. Returns how many were taken.
    pub async fn flush(&self) -> usize {
        let pending: Vec<(BurstKey, u64)> =
            self.shared.live.iter().map(|entry| (*entry.key(), entry.generation)).collect();

        let mut flushed = 0;
        for (key, generation) in pending {
            if let Some(burst) = self.shared.take(key, generation) {
                self.shared.hand_off(key, burst, FinalizeReason::Flush).await;
                flushed += 1;
            }
        }
        if flushed > 0 {
            tracing::info!(count = flushed, "Flushed live bursts.");
        }
        flushed
    }

    /// Number of bursts currently accepting messages.
    pub fn live_count(&self) -> usize {
        self.shared.live.len()
    }

    /// Number of parts buffered in the live burst for `key`, if any.
    pub fn live_parts(&self, key: &BurstKey) -> Option<usize> {
        self.shared.live.get(key).map(|burst| burst.parts.len())
    }

    /// Number of characters buffered in the live burst for `key`, if any.
    pub fn live_chars(&self, key: &BurstKey) -> Option<usize> {
        self.shared.live.get(key).map(|burst| burst.chars)
    }
}

impl Shared {
    async fn finalize_when_due(
        &self,
        key: BurstKey,
        generation: u64,
        first_seen_at: Instant,
        mut rearm: watch::Receiver<Instant>,
    ) {
        let hard_cap = sleep_until(first_seen_at + self.max_burst_duration);
        tokio::pin!(hard_cap);
        let mut last_seen_at = *rearm.borrow_and_update();

        let reason = loop {
            let quiet = sleep_until(last_seen_at + self.debounce_interval);
            tokio::select! {
                biased;
                _ = &mut hard_cap => break FinalizeReason::HardCap,
                changed = rearm.changed() => match changed {
                    Ok(()) => last_seen_at = *rearm.borrow_and_update(),
                    // Sender gone: the burst was already taken by a flush.
                    Err(_) => return,
                },
                _ = quiet => break FinalizeReason::QuietPeriod,
            }
        };

        if let Some(burst) = self.take(key, generation) {
            self.hand_off(key, burst, reason).await;
        }
    }

    /// Removes the burst only if it is still the instance `generation` refers to.
    fn take(&self, key: BurstKey, generation: u64) -> Option<LiveBurst> {
        self.live
            .remove_if(&key, |_, burst| burst.generation == generation)
            .map(|(_, burst)| burst)
    }

    async fn hand_off(&self, key: BurstKey, burst: LiveBurst, reason: FinalizeReason) {
        let text = burst.parts.join(" ").trim().to_string();

        if text.is_empty() {
            tracing::debug!(burst = %key, %reason, "Dropping empty burst.");
            self.metrics.record_burst_dropped_empty();
            return;
        }

        let finalized = FinalizedBurst {
            key,
            text,
            part_count: burst.parts.len(),
            first_seen_at: burst.first_seen_at,
            finalized_at: Instant::now(),
            reason,
        };
        tracing::debug!(
            burst = %key,
            %reason,
            parts = finalized.part_count,
            chars = finalized.text.chars().count(),
            "Finalized burst."
        );
        self.metrics.record_burst_finalized();

        if self.output.send(finalized).await.is_err() {
            tracing::warn!(burst = %key, "Burst channel closed, finalized burst discarded.");
        }
    }
}
