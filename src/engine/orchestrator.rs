//! Drives each finalized burst through classification, cooldown, tip
//! composition and delivery.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{Instant, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{classification::ClassificationGate, context_window::ContextWindow, cooldown::CooldownGate};
use crate::{
    metrics::PipelineMetrics,
    models::{CoachingMessage, FinalizedBurst, Verdict},
    providers::{CannedResponder, Notifier, Responder},
};

/// What happened to one burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstOutcome {
    /// The verdict did not meet the severity policy.
    NotQualifying(Verdict),
    /// The author was coached recently.
    CooldownActive,
    /// The coaching message was delivered.
    Delivered,
    /// Delivery was attempted and failed. The cooldown stays consumed.
    DeliveryFailed,
}

/// Consumes finalized bursts and delivers coaching messages.
pub struct DeliveryOrchestrator {
    context: Arc<ContextWindow>,
    context_lines: usize,
    gate: Arc<ClassificationGate>,
    cooldown: Arc<CooldownGate>,
    responder: Arc<dyn Responder>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<PipelineMetrics>,
    tracker: TaskTracker,
}

impl DeliveryOrchestrator {
    /// Creates an orchestrator over the given components.
    pub fn new(
        context: Arc<ContextWindow>,
        context_lines: usize,
        gate: Arc<ClassificationGate>,
        cooldown: Arc<CooldownGate>,
        responder: Arc<dyn Responder>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            context,
            context_lines,
            gate,
            cooldown,
            responder,
            notifier,
            metrics,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs one burst through the pipeline.
    #[tracing::instrument(skip_all, fields(burst = %burst.key))]
    pub async fn process_burst(&self, burst: FinalizedBurst) -> BurstOutcome {
        let author_id = burst.key.author_id;
        let context =
            self.context.labelled_snapshot(&burst.key.conversation(), author_id, self.context_lines);

        let verdict = self.gate.evaluate(&burst.text, &context).await;
        tracing::debug!(
            harmful = verdict.is_harmful,
            severity = %verdict.severity,
            language = %verdict.language,
            reason = %verdict.reason,
            "Burst classified."
        );

        if !self.gate.qualifies(&verdict) {
            return BurstOutcome::NotQualifying(verdict);
        }
        self.metrics.record_verdict_qualifying();

        if !self.cooldown.try_consume(author_id, Instant::now()) {
            tracing::info!(user_id = author_id, "Cooldown active, skipping coaching message.");
            self.metrics.record_cooldown_suppressed();
            return BurstOutcome::CooldownActive;
        }

        let tip = match self.responder.compose_tip(&burst.text, &verdict.language).await {
            Ok(tip) if !tip.trim().is_empty() => tip.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Responder returned an empty tip, using canned tip.");
                CannedResponder::tip_for(&verdict.language)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compose tip, using canned tip.");
                CannedResponder::tip_for(&verdict.language)
            }
        };

        let message = CoachingMessage {
            burst_text: burst.text,
            tip,
            severity: verdict.severity,
            language: verdict.language,
        };

        match self.notifier.deliver(author_id, &message).await {
            Ok(()) => {
                tracing::info!(user_id = author_id, severity = %message.severity, "Coaching message delivered.");
                self.metrics.record_delivery_succeeded();
                BurstOutcome::Delivered
            }
            Err(e) => {
                tracing::error!(user_id = author_id, error = %e, "Failed to deliver coaching message.");
                self.metrics.record_delivery_failed();
                BurstOutcome::DeliveryFailed
            }
        }
    }

    /// Processes bursts from `rx` until it closes or `drain` is cancelled.
    ///
    /// Each burst runs on its own task. On cancellation, bursts already queued
    /// are still picked up, then in-flight tasks get `shutdown_timeout` to
    /// finish.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<FinalizedBurst>,
        drain: CancellationToken,
        shutdown_timeout: Duration,
    ) {
        tracing::info!("Delivery orchestrator started.");
        loop {
            tokio::select! {
                biased;
                _ = drain.cancelled() => {
                    rx.close();
                    while let Ok(burst) = rx.try_recv() {
                        self.spawn_burst(burst);
                    }
                    break;
                }
                maybe_burst = rx.recv() => match maybe_burst {
                    Some(burst) => self.spawn_burst(burst),
                    None => break,
                },
            }
        }

        self.tracker.close();
        if timeout(shutdown_timeout, self.tracker.wait()).await.is_err() {
            tracing::warn!(
                pending = self.tracker.len(),
                "Timed out waiting for in-flight bursts, abandoning them."
            );
        }
        tracing::info!("Delivery orchestrator stopped.");
    }

    /// Number of bursts currently being processed.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    fn spawn_burst(self: &Arc<Self>, burst: FinalizedBurst) {
        let this = Arc::clone(self);
        self.tracker.spawn(async move {
            this.process_burst(burst).await;
        });
    }
}
