//! Hand-written provider doubles for integration tests, where the `mockall`
//! mocks are not available.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    models::{CoachingMessage, Severity, Verdict},
    notification::error::NotificationError,
    providers::{Classifier, ClassifierError, Notifier, ProviderError, Responder, ResponderError},
};

/// One recorded classifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyCall {
    /// The burst text.
    pub text: String,
    /// The context lines passed along.
    pub context: Vec<String>,
}

#[derive(Debug, Clone)]
enum StubAnswer {
    Verdict(Verdict),
    Fail,
}

/// A classifier returning a fixed answer after an optional delay.
#[derive(Debug, Clone)]
pub struct StubClassifier {
    answer: StubAnswer,
    delay: Duration,
    calls: Arc<Mutex<Vec<ClassifyCall>>>,
}

impl StubClassifier {
    /// Always answers with `verdict`.
    pub fn returning(verdict: Verdict) -> Self {
        Self { answer: StubAnswer::Verdict(verdict), delay: Duration::ZERO, calls: Arc::default() }
    }

    /// Always flags the text as harmful with `severity`.
    pub fn harmful(severity: Severity, language: &str) -> Self {
        Self::returning(Verdict {
            is_harmful: true,
            severity,
            language: language.to_string(),
            reason: "stub".to_string(),
        })
    }

    /// Always judges the text harmless.
    pub fn harmless() -> Self {
        Self::returning(Verdict {
            is_harmful: false,
            severity: Severity::Low,
            language: "en".to_string(),
            reason: "stub".to_string(),
        })
    }

    /// Always fails as if the service were down.
    pub fn failing() -> Self {
        Self { answer: StubAnswer::Fail, delay: Duration::ZERO, calls: Arc::default() }
    }

    /// Waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<ClassifyCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, text: &str, context: &[String]) -> Result<Verdict, ClassifierError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ClassifyCall { text: text.to_string(), context: context.to_vec() });
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.answer {
            StubAnswer::Verdict(verdict) => Ok(verdict.clone()),
            StubAnswer::Fail => Err(ClassifierError::Provider(ProviderError::MalformedResponse(
                "stub failure".to_string(),
            ))),
        }
    }
}

/// A responder returning a fixed tip, or failing when none is set.
#[derive(Debug, Clone, Default)]
pub struct StubResponder {
    tip: Option<String>,
}

impl StubResponder {
    /// Always answers with `tip`.
    pub fn with_tip(tip: &str) -> Self {
        Self { tip: Some(tip.to_string()) }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self { tip: None }
    }
}

#[async_trait]
impl Responder for StubResponder {
    async fn compose_tip(&self, _text: &str, _language: &str) -> Result<String, ResponderError> {
        self.tip.clone().ok_or(ResponderError::EmptyTip)
    }
}

/// A notifier that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<(u64, CoachingMessage)>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Creates a notifier that accepts every delivery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier that records, then rejects, every delivery.
    pub fn failing() -> Self {
        Self { delivered: Mutex::default(), fail: true }
    }

    /// Every delivery attempted so far, in order.
    pub fn deliveries(&self) -> Vec<(u64, CoachingMessage)> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Number of deliveries attempted so far.
    pub fn count(&self) -> usize {
        self.delivered.lock().map(|d| d.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(
        &self,
        user_id: u64,
        message: &CoachingMessage,
    ) -> Result<(), NotificationError> {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push((user_id, message.clone()));
        }
        if self.fail {
            return Err(NotificationError::NotifyFailed("recording notifier set to fail".into()));
        }
        Ok(())
    }
}
