//! Lifecycle management for the monitoring service.
//!
//! The [`Supervisor`] owns every long-running part of the pipeline: the
//! ingestion loop reading the [`MessageSource`], the delivery orchestrator,
//! the cooldown sweeper and the signal handler. It is assembled by the
//! [`SupervisorBuilder`], which wires the components from an [`AppConfig`].
//!
//! ## Shutdown
//!
//! Shutdown starts on `SIGINT`/`SIGTERM`, when the source is exhausted or
//! when a supervised task fails. In order:
//!
//! 1. Ingestion stops.
//! 2. Every live burst is flushed to the orchestrator.
//! 3. The orchestrator drains what is queued and waits up to
//!    `shutdown_timeout` for in-flight deliveries.

mod builder;

use std::sync::Arc;

pub use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::{signal, sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{AppConfig, LoaderError},
    engine::{
        burst_aggregator::AggregatorError, cooldown::CooldownGate, monitor::HarmMonitor,
        orchestrator::DeliveryOrchestrator,
    },
    metrics::{MetricsSnapshot, PipelineMetrics},
    models::{FinalizedBurst, InboundMessage},
    notification::error::NotificationError,
    providers::{ConsentOracle, MessageSource, ProviderError, SourceError},
};

/// Errors raised while assembling or running the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A message source was not provided to the `SupervisorBuilder`.
    #[error("Missing message source for Supervisor")]
    MissingMessageSource,

    /// The consent list could not be loaded.
    #[error("Failed to load consent list: {0}")]
    ConsentLoad(#[from] LoaderError),

    /// The notifier could not be created.
    #[error("Notifier creation failed: {0}")]
    Notifier(#[from] NotificationError),

    /// The remote provider could not be created.
    #[error("Provider creation failed: {0}")]
    ProviderError(#[from] ProviderError),

    /// The burst aggregator could not be created.
    #[error("Aggregator error: {0}")]
    Aggregator(#[from] AggregatorError),

    /// An error occurred due to an invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Decides which inbound messages the monitor may see.
struct Admission {
    self_user_id: Option<u64>,
    consent: Arc<dyn ConsentOracle>,
}

impl Admission {
    async fn admits(&self, message: &InboundMessage) -> bool {
        if message.is_bot || self.self_user_id == Some(message.author_id) {
            return false;
        }
        self.consent.is_consented(message.author_id).await
    }
}

/// The runtime manager of the monitoring service.
pub struct Supervisor {
    config: Arc<AppConfig>,
    monitor: Arc<HarmMonitor>,
    orchestrator: Arc<DeliveryOrchestrator>,
    cooldown: Arc<CooldownGate>,
    metrics: Arc<PipelineMetrics>,
    source: Box<dyn MessageSource>,
    burst_rx: mpsc::Receiver<FinalizedBurst>,
    admission: Admission,
    handle_signals: bool,
    cancellation_token: CancellationToken,
    join_set: tokio::task::JoinSet<()>,
}

impl Supervisor {
    /// Returns a new `SupervisorBuilder`.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// A token that stops the supervisor when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// The monitor fed by the ingestion loop.
    pub fn monitor(&self) -> Arc<HarmMonitor> {
        Arc::clone(&self.monitor)
    }

    /// The pipeline counters.
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Runs until a shutdown signal, source exhaustion or a task failure,
    /// then shuts down gracefully. Returns the final counters.
    pub async fn run(mut self) -> Result<MetricsSnapshot, SupervisorError> {
        if self.handle_signals {
            let cancellation_token = self.cancellation_token.clone();
            self.join_set.spawn(async move {
                wait_for_signal().await;
                cancellation_token.cancel();
            });
        }

        let drain = CancellationToken::new();
        let orchestrator_task = tokio::spawn(Arc::clone(&self.orchestrator).run(
            self.burst_rx,
            drain.clone(),
            self.config.shutdown_timeout,
        ));

        let cooldown = Arc::clone(&self.cooldown);
        let sweep_interval = self.config.cooldown_sweep_interval;
        let sweep_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = sweep_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = cooldown.purge_expired(Instant::now());
                        if purged > 0 {
                            tracing::debug!(purged, "Swept expired cooldown records.");
                        }
                    }
                }
            }
        });

        let monitor = Arc::clone(&self.monitor);
        let ingest_token = self.cancellation_token.clone();
        let mut source = self.source;
        let admission = self.admission;
        self.join_set.spawn(async move {
            ingest(source.as_mut(), &monitor, &admission, &ingest_token).await;
            ingest_token.cancel();
        });

        tracing::info!("Supervisor started.");
        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(())) => {}
                        Some(Err(e)) => {
                            tracing::error!("A critical task failed: {:?}. Initiating shutdown.", e);
                            self.cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = self.cancellation_token.cancelled() => break,
            }
        }

        self.join_set.shutdown().await;

        let flushed = self.monitor.flush().await;
        tracing::info!(flushed, "Flushed live bursts, draining deliveries.");
        drain.cancel();
        if let Err(e) = orchestrator_task.await {
            tracing::error!("Delivery orchestrator failed: {:?}", e);
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(?snapshot, "Supervisor shutdown complete.");
        Ok(snapshot)
    }
}

async fn ingest(
    source: &mut dyn MessageSource,
    monitor: &HarmMonitor,
    admission: &Admission,
    token: &CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => return,
            next = source.next_message() => next,
        };
        match next {
            Ok(Some(message)) => {
                if admission.admits(&message).await {
                    monitor.observe(&message, Instant::now());
                }
            }
            Ok(None) => {
                tracing::info!("Message source exhausted.");
                return;
            }
            Err(e @ SourceError::Parse { .. }) => {
                tracing::warn!(error = %e, "Skipping unreadable message.");
            }
            Err(e) => {
                tracing::error!(error = %e, "Message source failed, stopping ingestion.");
                return;
            }
        }
    }
}

async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::HarmConfig,
        models::ClassificationMode,
        providers::{JsonLinesSource, MockConsentOracle, MockNotifier},
    };

    fn config() -> AppConfig {
        let harm = HarmConfig { mode: ClassificationMode::HeuristicOnly, ..Default::default() };
        AppConfig::builder().harm(harm).require_consent(false).self_user_id(99).build()
    }

    fn line(author_id: u64, is_bot: bool, text: &str) -> String {
        serde_json::json!({
            "conversation_id": 1,
            "channel_id": 2,
            "author_id": author_id,
            "is_bot": is_bot,
            "text": text,
        })
        .to_string()
    }

    async fn run_with(
        input: String,
        notifier: MockNotifier,
        consent: Option<MockConsentOracle>,
    ) -> MetricsSnapshot {
        let mut builder = Supervisor::builder()
            .config(config())
            .source(Box::new(JsonLinesSource::new(std::io::Cursor::new(input.into_bytes()))))
            .notifier(Arc::new(notifier))
            .handle_signals(false);
        if let Some(consent) = consent {
            builder = builder.consent(Arc::new(consent));
        }
        builder.build().await.unwrap().run().await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_source_flushes_and_delivers() {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().withf(|user, _| *user == 5).times(1).returning(|_, _| Ok(()));

        let input = [line(5, false, "you are so stupid"), line(5, false, "seriously")].join("\n");
        let snapshot = run_with(input, notifier, None).await;

        assert_eq!(snapshot.messages_ingested, 2);
        assert_eq!(snapshot.bursts_finalized, 1);
        assert_eq!(snapshot.deliveries_succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bots_and_self_are_ignored() {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().never();

        let input = [line(6, true, "idiot"), line(99, false, "idiot")].join("\n");
        let snapshot = run_with(input, notifier, None).await;

        assert_eq!(snapshot.messages_ingested, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_consented_users_are_ignored() {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().withf(|user, _| *user == 7).times(1).returning(|_, _| Ok(()));
        let mut consent = MockConsentOracle::new();
        consent.expect_is_consented().returning(|user| user == 7);

        let input = [line(7, false, "you idiot"), line(8, false, "you idiot")].join("\n");
        let snapshot = run_with(input, notifier, Some(consent)).await;

        assert_eq!(snapshot.messages_ingested, 1);
        assert_eq!(snapshot.deliveries_succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_lines_are_skipped() {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().times(1).returning(|_, _| Ok(()));

        let input = ["garbage".to_string(), line(5, false, "trash")].join("\n");
        let snapshot = run_with(input, notifier, None).await;

        assert_eq!(snapshot.messages_ingested, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_token_stops_supervisor() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().never();

        let supervisor = Supervisor::builder()
            .config(config())
            .source(Box::new(JsonLinesSource::new(reader)))
            .notifier(Arc::new(notifier))
            .handle_signals(false)
            .build()
            .await
            .unwrap();
        let token = supervisor.cancellation_token();
        let handle = tokio::spawn(supervisor.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.messages_ingested, 0);
    }
}
