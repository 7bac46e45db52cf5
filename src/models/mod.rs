//! This module contains the data models for the pulsewatch pipeline.

pub mod burst;
pub mod classification;
pub mod coaching;
pub mod message;
pub mod notifier;

pub use burst::{FinalizeReason, FinalizedBurst};
pub use classification::{ClassificationMode, Severity, UNDETERMINED_LANGUAGE, Verdict};
pub use coaching::CoachingMessage;
pub use message::{BurstKey, ConversationKey, InboundMessage};
