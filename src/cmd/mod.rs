//! Subcommands of the `pulsewatch` binary other than `run`.

pub mod classify;

pub use classify::ClassifyArgs;
