//! Turns a finalized burst into a [`Verdict`] and decides whether it warrants
//! coaching.
//!
//! The gate never fails: remote errors and timeouts degrade to
//! [`Verdict::conservative`], and the heuristic can only add positives.

use std::{sync::Arc, time::Duration};

use super::heuristic::HeuristicDetector;
use crate::{
    config::HarmConfig,
    metrics::PipelineMetrics,
    models::{ClassificationMode, Severity, Verdict},
    providers::{Classifier, ClassifierError},
};

/// Remote classifier, heuristic fallback and severity policy.
pub struct ClassificationGate {
    mode: ClassificationMode,
    min_severity: Severity,
    classifier_timeout: Duration,
    classifier: Option<Arc<dyn Classifier>>,
    heuristic: HeuristicDetector,
    metrics: Arc<PipelineMetrics>,
}

impl ClassificationGate {
    /// Creates a gate. `classifier` may be absent, in which case remote
    /// classification always falls back.
    pub fn new(
        config: &HarmConfig,
        classifier: Option<Arc<dyn Classifier>>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            mode: config.mode,
            min_severity: config.min_severity,
            classifier_timeout: config.classifier_timeout,
            classifier,
            heuristic: HeuristicDetector::new(config)?,
            metrics,
        })
    }

    /// Replaces the classification mode.
    pub fn with_mode(mut self, mode: ClassificationMode) -> Self {
        self.mode = mode;
        self
    }

    /// The active classification mode.
    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    /// The local detector used by this gate.
    pub fn heuristic(&self) -> &HeuristicDetector {
        &self.heuristic
    }

    /// Classifies `text` according to the configured mode.
    pub async fn evaluate(&self, text: &str, context: &[String]) -> Verdict {
        let verdict = match self.mode {
            ClassificationMode::HeuristicOnly => self.heuristic_verdict(text),
            ClassificationMode::RemoteOnly => self.remote_verdict(text, context).await,
            ClassificationMode::Hybrid => {
                let remote = self.remote_verdict(text, context).await;
                if remote.is_harmful {
                    remote
                } else if let Some(signal) = self.heuristic.detect(text) {
                    tracing::debug!(%signal, "Heuristic flagged text the remote classifier passed.");
                    Verdict::keyword_hit()
                } else {
                    remote
                }
            }
        };

        if verdict.is_harmful {
            self.metrics.record_verdict_harmful();
        }
        verdict
    }

    /// Whether `verdict` is harmful and at least as severe as the configured
    /// minimum.
    pub fn qualifies(&self, verdict: &Verdict) -> bool {
        verdict.is_harmful && verdict.severity >= self.min_severity
    }

    fn heuristic_verdict(&self, text: &str) -> Verdict {
        match self.heuristic.detect(text) {
            Some(signal) => {
                tracing::debug!(%signal, "Heuristic flagged text.");
                Verdict::keyword_hit()
            }
            None => Verdict::heuristic_miss(),
        }
    }

    async fn remote_verdict(&self, text: &str, context: &[String]) -> Verdict {
        let result = match &self.classifier {
            None => Err(ClassifierError::Unavailable),
            Some(classifier) => {
                tokio::time::timeout(self.classifier_timeout, classifier.classify(text, context))
                    .await
                    .unwrap_or(Err(ClassifierError::Timeout(self.classifier_timeout)))
            }
        };

        match result {
            Ok(verdict) => verdict,
            Err(ClassifierError::Unavailable) => {
                self.metrics.record_classifier_fallback();
                tracing::debug!("No remote classifier configured, using conservative verdict.");
                Verdict::conservative()
            }
            Err(e) => {
                self.metrics.record_classifier_fallback();
                tracing::warn!(error = %e, "Remote classification failed, using conservative verdict.");
                Verdict::conservative()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::providers::{MockClassifier, ProviderError};

    fn config(mode: ClassificationMode) -> HarmConfig {
        HarmConfig { mode, ..HarmConfig::default() }
    }

    fn gate(mode: ClassificationMode, classifier: Option<Arc<dyn Classifier>>) -> ClassificationGate {
        ClassificationGate::new(&config(mode), classifier, Arc::new(PipelineMetrics::default())).unwrap()
    }

    fn remote(verdict: Verdict) -> Arc<dyn Classifier> {
        let mut mock = MockClassifier::new();
        mock.expect_classify().returning(move |_, _| Ok(verdict.clone()));
        Arc::new(mock)
    }

    fn failing() -> Arc<dyn Classifier> {
        let mut mock = MockClassifier::new();
        mock.expect_classify().returning(|_, _| {
            Err(ClassifierError::Provider(ProviderError::MalformedResponse("not json".into())))
        });
        Arc::new(mock)
    }

    struct SlowClassifier;

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn classify(&self, _: &str, _: &[String]) -> Result<Verdict, ClassifierError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Verdict { is_harmful: true, severity: Severity::High, language: "en".into(), reason: "late".into() })
        }
    }

    fn harmful(severity: Severity) -> Verdict {
        Verdict { is_harmful: true, severity, language: "en".into(), reason: "insult".into() }
    }

    fn benign() -> Verdict {
        Verdict { is_harmful: false, severity: Severity::Low, language: "en".into(), reason: "ok".into() }
    }

    #[tokio::test]
    async fn test_heuristic_only_without_classifier() {
        let gate = gate(ClassificationMode::HeuristicOnly, None);
        assert_eq!(gate.evaluate("you are so stupid", &[]).await, Verdict::keyword_hit());
        assert_eq!(gate.evaluate("انت غبي", &[]).await, Verdict::keyword_hit());
        assert_eq!(gate.evaluate("see you tomorrow", &[]).await, Verdict::heuristic_miss());
    }

    #[tokio::test]
    async fn test_heuristic_only_never_calls_remote() {
        let mut mock = MockClassifier::new();
        mock.expect_classify().never();
        let gate = gate(ClassificationMode::HeuristicOnly, Some(Arc::new(mock)));
        assert!(gate.evaluate("idiot", &[]).await.is_harmful);
    }

    #[tokio::test]
    async fn test_remote_only_uses_remote_verdict() {
        let gate = gate(ClassificationMode::RemoteOnly, Some(remote(harmful(Severity::High))));
        assert_eq!(gate.evaluate("anything", &[]).await, harmful(Severity::High));
    }

    #[tokio::test]
    async fn test_remote_only_failure_is_conservative() {
        let with_failure = gate(ClassificationMode::RemoteOnly, Some(failing()));
        assert_eq!(with_failure.evaluate("you are so stupid", &[]).await, Verdict::conservative());

        let without_remote = gate(ClassificationMode::RemoteOnly, None);
        assert_eq!(without_remote.evaluate("you are so stupid", &[]).await, Verdict::conservative());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_timeout_is_conservative() {
        let gate = gate(ClassificationMode::RemoteOnly, Some(Arc::new(SlowClassifier)));
        let started = tokio::time::Instant::now();
        assert_eq!(gate.evaluate("hello", &[]).await, Verdict::conservative());
        assert_eq!(started.elapsed(), HarmConfig::default().classifier_timeout);
        assert_eq!(gate.metrics.snapshot().classifier_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_hybrid_keeps_harmful_remote_verdict() {
        let gate = gate(ClassificationMode::Hybrid, Some(remote(harmful(Severity::High))));
        assert_eq!(gate.evaluate("you are so stupid", &[]).await, harmful(Severity::High));
    }

    #[tokio::test]
    async fn test_hybrid_heuristic_overrides_benign_remote() {
        let gate = gate(ClassificationMode::Hybrid, Some(remote(benign())));
        assert_eq!(gate.evaluate("you are so stupid", &[]).await, Verdict::keyword_hit());
        assert_eq!(gate.evaluate("nice work", &[]).await, benign());
    }

    #[tokio::test]
    async fn test_hybrid_falls_back_to_heuristic_on_failure() {
        let gate = gate(ClassificationMode::Hybrid, Some(failing()));
        assert_eq!(gate.evaluate("انت غبي", &[]).await, Verdict::keyword_hit());
        assert_eq!(gate.evaluate("thanks a lot", &[]).await, Verdict::conservative());
    }

    #[tokio::test]
    async fn test_context_is_forwarded() {
        let mut mock = MockClassifier::new();
        mock.expect_classify()
            .withf(|text, context| {
                text.to_string() == "hm"
                    && context.len() == 2
                    && context[0] == "You: hi"
                    && context[1] == "Other: hey"
            })
            .times(1)
            .returning(|_, _| Ok(Verdict::conservative()));
        let gate = gate(ClassificationMode::RemoteOnly, Some(Arc::new(mock)));
        gate.evaluate("hm", &["You: hi".to_string(), "Other: hey".to_string()]).await;
    }

    #[test]
    fn test_severity_policy() {
        let gate = gate(ClassificationMode::Hybrid, None);
        assert!(!gate.qualifies(&harmful(Severity::Low)));
        assert!(gate.qualifies(&harmful(Severity::Medium)));
        assert!(gate.qualifies(&harmful(Severity::High)));
        assert!(!gate.qualifies(&Verdict { is_harmful: false, ..harmful(Severity::High) }));

        let strict = ClassificationGate::new(
            &HarmConfig { min_severity: Severity::High, ..HarmConfig::default() },
            None,
            Arc::new(PipelineMetrics::default()),
        )
        .unwrap();
        assert!(!strict.qualifies(&Verdict::keyword_hit()));

        let lenient = ClassificationGate::new(
            &HarmConfig { min_severity: Severity::Low, ..HarmConfig::default() },
            None,
            Arc::new(PipelineMetrics::default()),
        )
        .unwrap();
        assert!(lenient.qualifies(&harmful(Severity::Low)));
    }
}
