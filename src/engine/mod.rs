//! The pulsewatch engine: context tracking, burst aggregation, classification,
//! cooldown and delivery.

pub mod burst_aggregator;
pub mod classification;
pub mod context_window;
pub mod cooldown;
pub mod heuristic;
pub mod monitor;
pub mod orchestrator;
pub mod text;
