//! This module defines the data structures for notifier and remote provider
//! configurations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::HttpRetryConfig;

/// Configuration for a generic webhook notifier.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WebhookConfig {
    /// The URL of the webhook endpoint.
    pub url: Url,
    /// The HTTP method to use for the webhook (e.g., "POST", "PUT").
    pub method: Option<String>,
    /// An optional secret for signing webhook requests.
    pub secret: Option<String>,
    /// Optional custom headers to include in the webhook request.
    pub headers: Option<HashMap<String, String>>,
    /// The retry policy configuration for HTTP requests.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

/// The type of notifier used to deliver coaching messages.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifierTypeConfig {
    /// Print coaching messages to standard output.
    #[default]
    Stdout,
    /// Post coaching messages to a webhook.
    Webhook(WebhookConfig),
}

/// Error types for notifier configuration validation.
#[derive(Debug, Clone, Error)]
pub enum NotifierTypeConfigError {
    /// The webhook URL does not use http or https.
    #[error("Webhook URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    /// The webhook secret is present but empty.
    #[error("Webhook secret cannot be empty when provided.")]
    EmptySecret,
}

impl NotifierTypeConfig {
    /// Validates the notifier configuration.
    pub fn validate(&self) -> Result<(), NotifierTypeConfigError> {
        match self {
            NotifierTypeConfig::Webhook(config) => {
                if !matches!(config.url.scheme(), "http" | "https") {
                    return Err(NotifierTypeConfigError::UnsupportedScheme(
                        config.url.scheme().to_string(),
                    ));
                }
                if config.secret.as_deref().is_some_and(str::is_empty) {
                    return Err(NotifierTypeConfigError::EmptySecret);
                }
                Ok(())
            }
            NotifierTypeConfig::Stdout => Ok(()),
        }
    }
}

fn default_deployment() -> String {
    "gpt-4.1".to_string()
}

fn default_api_version() -> String {
    "2025-01-01-preview".to_string()
}

/// Connection settings for the Azure OpenAI chat-completions deployment used
/// as remote classifier and responder.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: Url,
    /// API key sent in the `api-key` header.
    pub api_key: String,
    /// Deployment name.
    #[serde(default = "default_deployment")]
    pub deployment: String,
    /// REST API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Retry policy for transient HTTP failures.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

impl AzureOpenAiConfig {
    /// The chat-completions URL for this deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}
