//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Admission, Supervisor, SupervisorError};
use crate::{
    config::AppConfig,
    engine::{
        burst_aggregator::BurstAggregator, classification::ClassificationGate,
        context_window::ContextWindow, cooldown::CooldownGate, monitor::HarmMonitor,
        orchestrator::DeliveryOrchestrator,
    },
    http_client::HttpClientPool,
    metrics::PipelineMetrics,
    models::ClassificationMode,
    notification::build_notifier,
    providers::{
        AllowAll, AzureOpenAiClient, CannedResponder, Classifier, ConsentList, ConsentOracle, MessageSource,
        Notifier, Responder,
    },
};

/// A builder for creating a `Supervisor` instance.
///
/// Only the configuration and the message source are required. Components
/// that are not supplied are built from the configuration: the Azure client
/// when `azure` is set, the notifier from `notifier`, and the consent list
/// from `consent_config_path` when consent is required.
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    source: Option<Box<dyn MessageSource>>,
    classifier: Option<Arc<dyn Classifier>>,
    responder: Option<Arc<dyn Responder>>,
    notifier: Option<Arc<dyn Notifier>>,
    consent: Option<Arc<dyn ConsentOracle>>,
    handle_signals: bool,
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self {
            config: None,
            source: None,
            classifier: None,
            responder: None,
            notifier: None,
            consent: None,
            handle_signals: true,
        }
    }
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the source of inbound messages.
    pub fn source(mut self, source: Box<dyn MessageSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Overrides the remote classifier.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Overrides the tip responder.
    pub fn responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Overrides the notifier.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Overrides the consent oracle. Applies even when consent is not
    /// required by the configuration.
    pub fn consent(mut self, consent: Arc<dyn ConsentOracle>) -> Self {
        self.consent = Some(consent);
        self
    }

    /// Whether the supervisor listens for `SIGINT`/`SIGTERM`. Defaults to `true`.
    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    pub async fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let source = self.source.ok_or(SupervisorError::MissingMessageSource)?;

        if config.burst_channel_capacity == 0 {
            return Err(SupervisorError::InvalidConfiguration(
                "burst_channel_capacity must be greater than zero".into(),
            ));
        }

        let pool = HttpClientPool::new(config.http_base_config.clone());

        let azure = match &config.azure {
            Some(azure_config) if self.classifier.is_none() || self.responder.is_none() => {
                tracing::info!(deployment = %azure_config.deployment, "Using Azure OpenAI.");
                Some(Arc::new(AzureOpenAiClient::from_pool(azure_config, &pool).await?))
            }
            _ => None,
        };
        let classifier = self
            .classifier
            .or_else(|| azure.clone().map(|client| client as Arc<dyn Classifier>));
        let responder = self
            .responder
            .or_else(|| azure.map(|client| client as Arc<dyn Responder>))
            .unwrap_or_else(|| Arc::new(CannedResponder));

        if classifier.is_none() && config.harm.mode != ClassificationMode::HeuristicOnly {
            tracing::warn!(
                mode = %config.harm.mode,
                "No remote classifier configured, remote verdicts will always fall back."
            );
        }

        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => build_notifier(&config.notifier, &pool).await?,
        };

        let consent: Arc<dyn ConsentOracle> = match self.consent {
            Some(consent) => consent,
            None if config.require_consent => {
                let list = ConsentList::from_file(&config.consent_config_path)?;
                if list.is_empty() {
                    tracing::warn!("Consent is required but nobody has consented yet.");
                }
                Arc::new(list)
            }
            None => {
                tracing::warn!("Consent is not required, every user will be monitored.");
                Arc::new(AllowAll)
            }
        };

        let metrics = Arc::new(PipelineMetrics::default());
        let context = Arc::new(ContextWindow::new(config.harm.context_capacity));
        let (burst_tx, burst_rx) = mpsc::channel(config.burst_channel_capacity);

        let aggregator = BurstAggregator::new(&config.harm, burst_tx, Arc::clone(&metrics))?;
        let gate = ClassificationGate::new(&config.harm, classifier, Arc::clone(&metrics))
            .map_err(|e| SupervisorError::InvalidConfiguration(e.to_string()))?;
        let cooldown = Arc::new(CooldownGate::new(config.harm.cooldown_interval));

        let orchestrator = Arc::new(DeliveryOrchestrator::new(
            Arc::clone(&context),
            config.harm.context_lines,
            Arc::new(gate),
            Arc::clone(&cooldown),
            responder,
            notifier,
            Arc::clone(&metrics),
        ));
        let monitor = Arc::new(HarmMonitor::new(context, aggregator, Arc::clone(&metrics)));

        let admission = Admission { self_user_id: config.self_user_id, consent };

        Ok(Supervisor {
            config: Arc::new(config),
            monitor,
            orchestrator,
            cooldown,
            metrics,
            source,
            burst_rx,
            admission,
            handle_signals: self.handle_signals,
            cancellation_token: CancellationToken::new(),
            join_set: tokio::task::JoinSet::new(),
        })
    }
}
