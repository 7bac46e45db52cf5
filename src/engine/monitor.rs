//! The host-facing entry point of the pipeline.

use std::sync::Arc;

use tokio::time::Instant;

use super::{burst_aggregator::BurstAggregator, context_window::ContextWindow};
use crate::{
    metrics::PipelineMetrics,
    models::{BurstKey, ConversationKey, InboundMessage},
};

/// Records every observed message into the context window and feeds it to
/// the burst aggregator. Never fails and never waits.
pub struct HarmMonitor {
    context: Arc<ContextWindow>,
    aggregator: BurstAggregator,
    metrics: Arc<PipelineMetrics>,
}

impl HarmMonitor {
    /// Creates a monitor over the given context window and aggregator.
    pub fn new(
        context: Arc<ContextWindow>,
        aggregator: BurstAggregator,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self { context, aggregator, metrics }
    }

    /// Observes one message. Blank messages only enter the context window.
    pub fn on_message(
        &self,
        conversation_id: Option<u64>,
        channel_id: u64,
        author_id: u64,
        text: &str,
        now: Instant,
    ) {
        self.context.record(ConversationKey::new(conversation_id, channel_id), author_id, text);

        if text.trim().is_empty() {
            return;
        }
        self.metrics.record_message_ingested();
        self.aggregator.ingest(BurstKey::new(conversation_id, channel_id, author_id), text, now);
    }

    /// Observes an [`InboundMessage`] received at `now`.
    pub fn observe(&self, message: &InboundMessage, now: Instant) {
        self.on_message(
            message.conversation_id,
            message.channel_id,
            message.author_id,
            &message.text,
            now,
        );
    }

    /// Hands every live burst to the orchestrator without waiting for its
    /// timers. Used on shutdown.
    pub async fn flush(&self) -> usize {
        self.aggregator.flush().await
    }

    /// Number of bursts still accepting messages.
    pub fn live_bursts(&self) -> usize {
        self.aggregator.live_count()
    }

    /// The shared context window.
    pub fn context(&self) -> &Arc<ContextWindow> {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::config::HarmConfig;

    fn monitor() -> (HarmMonitor, mpsc::Receiver<crate::models::FinalizedBurst>) {
        let config = HarmConfig::default();
        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, rx) = mpsc::channel(8);
        let aggregator = BurstAggregator::new(&config, tx, metrics.clone()).unwrap();
        let monitor = HarmMonitor::new(Arc::new(ContextWindow::new(10)), aggregator, metrics);
        (monitor, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_message_records_context_and_opens_burst() {
        let (monitor, mut rx) = monitor();
        monitor.on_message(Some(1), 2, 3, "you are so stupid", Instant::now());

        assert_eq!(monitor.live_bursts(), 1);
        let lines = monitor.context().snapshot(&ConversationKey::new(Some(1), 2), 10);
        assert_eq!(lines.len(), 1);

        let burst = rx.recv().await.unwrap();
        assert_eq!(burst.key, BurstKey::new(Some(1), 2, 3));
        assert_eq!(burst.text, "you are so stupid");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_message_is_context_only() {
        let (monitor, mut rx) = monitor();
        monitor.on_message(None, 2, 3, "  ", Instant::now());

        assert_eq!(monitor.live_bursts(), 0);
        assert_eq!(monitor.context().snapshot(&ConversationKey::new(None, 2), 10).len(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_emits_pending_bursts() {
        let (monitor, mut rx) = monitor();
        let message = InboundMessage {
            conversation_id: None,
            channel_id: 4,
            author_id: 5,
            is_bot: false,
            text: "idiot".into(),
        };
        monitor.observe(&message, Instant::now());

        assert_eq!(monitor.flush().await, 1);
        assert_eq!(rx.recv().await.unwrap().text, "idiot");
    }
}
