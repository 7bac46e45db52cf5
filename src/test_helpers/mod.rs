//! A set of helpers for testing

mod harm_config;
mod http_client;
mod pipeline;
mod stubs;

pub use harm_config::HarmConfigBuilder;
pub use http_client::create_test_http_client;
pub use pipeline::{TEST_CONVERSATION, TestPipeline};
pub use stubs::{ClassifyCall, RecordingNotifier, StubClassifier, StubResponder};
