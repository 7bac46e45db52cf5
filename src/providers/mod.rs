//! Collaborators of the monitoring pipeline.
//!
//! The engine only sees the traits in [`traits`]. This module also hosts
//! their concrete implementations: the Azure OpenAI client, the offline
//! canned responder, consent lists and the JSON-lines message source.

mod azure;
mod canned;
mod consent;
pub mod error;
mod source;
pub mod traits;

pub use azure::AzureOpenAiClient;
pub use canned::CannedResponder;
pub use consent::{AllowAll, CONSENT_KEY, ConsentList};
pub use error::ProviderError;
pub use source::{JsonLinesSource, SourceError};
#[cfg(test)]
pub use traits::{MockClassifier, MockConsentOracle, MockMessageSource, MockNotifier, MockResponder};
pub use traits::{
    Classifier, ClassifierError, ConsentOracle, MessageSource, Notifier, Responder, ResponderError,
};
