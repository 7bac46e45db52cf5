#![warn(missing_docs)]
//! Pulsewatch is a passive monitor that spots bursts of harmful messages in
//! workplace chat and privately coaches their authors.
//!
//! Messages enter through [`engine::monitor::HarmMonitor`], are merged into
//! per-author bursts, classified, filtered by a per-user cooldown and turned
//! into coaching messages by the delivery orchestrator.

pub mod cmd;
pub mod config;
pub mod engine;
pub mod http_client;
pub mod metrics;
pub mod models;
pub mod notification;
pub mod providers;
pub mod supervisor;
pub mod test_helpers;
