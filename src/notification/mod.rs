//! # Notification
//!
//! Delivery of coaching messages. A [`Notifier`] is picked from configuration
//! by [`build_notifier`]:
//!
//! - `stdout`: prints the rendered message, for local runs.
//! - `webhook`: posts a JSON document to the chat host, optionally signed.

use std::sync::Arc;

use crate::{
    http_client::HttpClientPool,
    models::notifier::NotifierTypeConfig,
    providers::Notifier,
};

pub mod error;
mod stdout;
mod webhook;

use error::NotificationError;
pub use stdout::StdoutNotifier;
pub use webhook::WebhookNotifier;

/// Builds the notifier described by `config`, drawing HTTP clients from `pool`.
pub async fn build_notifier(
    config: &NotifierTypeConfig,
    pool: &HttpClientPool,
) -> Result<Arc<dyn Notifier>, NotificationError> {
    config.validate().map_err(|e| NotificationError::ConfigError(e.to_string()))?;

    match config {
        NotifierTypeConfig::Stdout => Ok(Arc::new(StdoutNotifier)),
        NotifierTypeConfig::Webhook(webhook) => {
            let client = pool.get_or_create(&webhook.retry_policy).await?;
            tracing::info!(url = %webhook.url, signed = webhook.secret.is_some(), "Using webhook notifier.");
            Ok(Arc::new(WebhookNotifier::new(webhook, client)?))
        }
    }
}
