//! Capability interfaces of the monitoring pipeline's collaborators.
//!
//! Each trait has a remote implementation, a local one and, under `cfg(test)`,
//! a `mockall` mock.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use super::{error::ProviderError, source::SourceError};
use crate::{
    models::{CoachingMessage, InboundMessage, Verdict},
    notification::error::NotificationError,
};

/// Why a classifier could not produce a verdict.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The remote service failed.
    #[error("Classifier provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The call did not finish in time.
    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),

    /// No classifier is configured.
    #[error("No classifier configured")]
    Unavailable,
}

/// Why a responder could not compose a tip.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The remote service failed.
    #[error("Responder provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The service answered with an empty tip.
    #[error("Responder returned an empty tip")]
    EmptyTip,
}

/// Judges whether a text is harmful.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies `text`, given the recent conversation lines as context.
    async fn classify(&self, text: &str, context: &[String]) -> Result<Verdict, ClassifierError>;
}

/// Writes a short de-escalation tip.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    /// Composes a tip about `text` in `language` (ISO code, `und` if unknown).
    async fn compose_tip(&self, text: &str, language: &str) -> Result<String, ResponderError>;
}

/// Delivers a coaching message to a user in private.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` to `user_id`.
    async fn deliver(&self, user_id: u64, message: &CoachingMessage)
    -> Result<(), NotificationError>;
}

/// Answers whether a user opted in to monitoring.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConsentOracle: Send + Sync {
    /// Whether messages from `user_id` may be monitored.
    async fn is_consented(&self, user_id: u64) -> bool;
}

/// A stream of inbound chat messages.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageSource: Send {
    /// The next message, or `None` once the source is exhausted.
    async fn next_message(&mut self) -> Result<Option<InboundMessage>, SourceError>;
}
