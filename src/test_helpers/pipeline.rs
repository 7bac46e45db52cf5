//! An in-process pipeline wired the way the supervisor wires it, without a
//! message source or signal handling.

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

use super::stubs::RecordingNotifier;
use crate::{
    config::HarmConfig,
    engine::{
        burst_aggregator::BurstAggregator, classification::ClassificationGate,
        context_window::ContextWindow, cooldown::CooldownGate, monitor::HarmMonitor,
        orchestrator::DeliveryOrchestrator,
    },
    metrics::{MetricsSnapshot, PipelineMetrics},
    providers::{CannedResponder, Classifier, Responder},
};

/// Conversation id used by [`TestPipeline::say`].
pub const TEST_CONVERSATION: u64 = 1;

/// Monitor, orchestrator and a recording notifier, running on the current
/// runtime.
pub struct TestPipeline {
    /// The entry point messages are fed to.
    pub monitor: HarmMonitor,
    /// Records every coaching message.
    pub notifier: Arc<RecordingNotifier>,
    /// Shared counters.
    pub metrics: Arc<PipelineMetrics>,
    /// The cooldown ledger.
    pub cooldown: Arc<CooldownGate>,
    drain: CancellationToken,
    task: JoinHandle<()>,
}

impl TestPipeline {
    /// Builds a pipeline with the canned responder and an accepting notifier.
    pub fn new(config: &HarmConfig, classifier: Option<Arc<dyn Classifier>>) -> Self {
        Self::with_parts(
            config,
            classifier,
            Arc::new(CannedResponder),
            Arc::new(RecordingNotifier::new()),
        )
    }

    /// Builds a pipeline from explicit parts.
    ///
    /// # Panics
    ///
    /// When called outside a Tokio runtime or with an invalid keyword list.
    pub fn with_parts(
        config: &HarmConfig,
        classifier: Option<Arc<dyn Classifier>>,
        responder: Arc<dyn Responder>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let metrics = Arc::new(PipelineMetrics::default());
        let context = Arc::new(ContextWindow::new(config.context_capacity));
        let (tx, rx) = mpsc::channel(64);

        let aggregator = BurstAggregator::new(config, tx, Arc::clone(&metrics))
            .expect("test pipeline needs a Tokio runtime");
        let gate = ClassificationGate::new(config, classifier, Arc::clone(&metrics))
            .expect("valid keyword configuration");
        let cooldown = Arc::new(CooldownGate::new(config.cooldown_interval));

        let orchestrator = Arc::new(DeliveryOrchestrator::new(
            Arc::clone(&context),
            config.context_lines,
            Arc::new(gate),
            Arc::clone(&cooldown),
            responder,
            notifier.clone(),
            Arc::clone(&metrics),
        ));
        let drain = CancellationToken::new();
        let task = tokio::spawn(orchestrator.run(rx, drain.clone(), Duration::from_secs(30)));

        Self {
            monitor: HarmMonitor::new(context, aggregator, Arc::clone(&metrics)),
            notifier,
            metrics,
            cooldown,
            drain,
            task,
        }
    }

    /// Feeds a message from `author_id` in `channel_id` of the test
    /// conversation, received now.
    pub fn say(&self, channel_id: u64, author_id: u64, text: &str) {
        self.monitor.on_message(Some(TEST_CONVERSATION), channel_id, author_id, text, Instant::now());
    }

    /// Flushes live bursts, drains the orchestrator and returns the counters.
    pub async fn shutdown(self) -> MetricsSnapshot {
        self.monitor.flush().await;
        self.drain.cancel();
        let _ = self.task.await;
        self.metrics.snapshot()
    }
}
