//! Webhook delivery of coaching messages.
//!
//! The host that owns the chat transport receives a JSON document per
//! coaching message and forwards it to the user in private. Requests can be
//! signed with HMAC-SHA256 so the host can authenticate them.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{
    Method,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use sha2::Sha256;

use super::error::NotificationError;
use crate::{
    models::{CoachingMessage, notifier::WebhookConfig},
    providers::Notifier,
};

/// HMAC SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Posts coaching messages to a webhook.
#[derive(Debug)]
pub struct WebhookNotifier {
    /// Webhook URL for message delivery
    url: String,
    /// Configured HTTP client for webhook requests with retry capabilities
    client: Arc<ClientWithMiddleware>,
    /// HTTP method to use for the webhook request
    method: Method,
    /// Secret used to sign the request body
    secret: Option<String>,
    /// Extra headers to send with every request
    headers: HashMap<String, String>,
}

impl WebhookNotifier {
    /// Creates a new webhook notifier.
    pub fn new(
        config: &WebhookConfig,
        http_client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        let method = match config.method.as_deref() {
            None => Method::POST,
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(|e| {
                NotificationError::ConfigError(format!("Invalid HTTP method '{m}': {e}"))
            })?,
        };
        Ok(Self {
            url: config.url.to_string(),
            client: http_client,
            method,
            secret: config.secret.clone(),
            headers: config.headers.clone().unwrap_or_default(),
        })
    }

    /// Signs `payload` with `secret`, returning the hex signature and the
    /// millisecond timestamp that was mixed into it.
    pub fn sign_payload(
        &self,
        secret: &str,
        payload: &serde_json::Value,
    ) -> Result<(String, String), NotificationError> {
        // `new_from_slice` accepts empty keys.
        if secret.is_empty() {
            return Err(NotificationError::NotifyFailed(
                "Invalid secret: cannot be empty.".to_string(),
            ));
        }

        let timestamp = Utc::now().timestamp_millis();

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| NotificationError::ConfigError(format!("Invalid secret: {e}")))?;

        let serialized_payload = serde_json::to_string(payload).map_err(|e| {
            NotificationError::InternalError(format!("Failed to serialize payload: {e}"))
        })?;
        mac.update(format!("{serialized_payload}{timestamp}").as_bytes());

        let signature = hex::encode(mac.finalize().into_bytes());

        Ok((signature, timestamp.to_string()))
    }

    /// Sends a JSON payload to the webhook.
    pub async fn notify_json(&self, payload: &serde_json::Value) -> Result<(), NotificationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );

        if let Some(secret) = &self.secret {
            let (signature, timestamp) = self.sign_payload(secret, payload)?;
            headers.insert(
                HeaderName::from_static("x-signature"),
                HeaderValue::from_str(&signature).map_err(|e| {
                    NotificationError::NotifyFailed(format!("Invalid signature value: {e}"))
                })?,
            );
            headers.insert(
                HeaderName::from_static("x-timestamp"),
                HeaderValue::from_str(&timestamp).map_err(|e| {
                    NotificationError::NotifyFailed(format!("Invalid timestamp value: {e}"))
                })?,
            );
        }

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                NotificationError::NotifyFailed(format!("Invalid header name: {key}: {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                NotificationError::NotifyFailed(format!(
                    "Invalid header value for {key}: {value}: {e}"
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        let response = self
            .client
            .request(self.method.clone(), self.url.as_str())
            .headers(headers)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::NotifyFailed(format!(
                "Webhook request failed with status: {status}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(
        &self,
        user_id: u64,
        message: &CoachingMessage,
    ) -> Result<(), NotificationError> {
        let payload = json!({
            "user_id": user_id,
            "message": message.render(),
            "tip": message.tip,
            "severity": message.severity,
            "language": message.language,
        });
        self.notify_json(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use url::Url;

    use super::*;
    use crate::{config::HttpRetryConfig, models::Severity};

    fn create_test_http_client() -> Arc<ClientWithMiddleware> {
        Arc::new(reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build())
    }

    fn create_test_notifier(
        url: &str,
        secret: Option<&str>,
        headers: Option<HashMap<String, String>>,
    ) -> WebhookNotifier {
        let config = WebhookConfig {
            url: Url::parse(url).unwrap(),
            method: None,
            secret: secret.map(str::to_string),
            headers,
            retry_policy: HttpRetryConfig::default(),
        };
        WebhookNotifier::new(&config, create_test_http_client()).unwrap()
    }

    fn coaching_message() -> CoachingMessage {
        CoachingMessage {
            burst_text: "you are useless".into(),
            tip: "Try naming the problem instead of the person.".into(),
            severity: Severity::High,
            language: "en".into(),
        }
    }

    #[test]
    fn test_sign_payload_produces_hex_and_timestamp() {
        let notifier = create_test_notifier("https://webhook.example.com", Some("s"), None);
        let (signature, timestamp) =
            notifier.sign_payload("test-secret", &json!({"user_id": 1})).unwrap();

        assert_eq!(signature.len(), 64);
        assert!(hex::decode(&signature).is_ok());
        assert!(timestamp.parse::<i64>().is_ok());
    }

    #[test]
    fn test_sign_payload_rejects_empty_secret() {
        let notifier = create_test_notifier("https://webhook.example.com", None, None);
        let result = notifier.sign_payload("", &json!({}));
        assert!(matches!(result, Err(NotificationError::NotifyFailed(_))));
    }

    #[test]
    fn test_invalid_method_is_a_config_error() {
        let config = WebhookConfig {
            url: Url::parse("https://webhook.example.com").unwrap(),
            method: Some("NOT A METHOD".into()),
            secret: None,
            headers: None,
            retry_policy: HttpRetryConfig::default(),
        };
        let result = WebhookNotifier::new(&config, create_test_http_client());
        assert!(matches!(result, Err(NotificationError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_deliver_posts_signed_coaching_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("X-Signature", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
            .match_header("X-Timestamp", Matcher::Regex("^[0-9]+$".to_string()))
            .match_header("Content-Type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "user_id": 42,
                "severity": "high",
                "language": "en",
                "tip": "Try naming the problem instead of the person.",
            })))
            .with_status(200)
            .create_async()
            .await;

        let notifier = create_test_notifier(server.url().as_str(), Some("top-secret"), None);
        notifier.deliver(42, &coaching_message()).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_deliver_reports_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").with_status(500).create_async().await;

        let notifier = create_test_notifier(server.url().as_str(), None, None);
        let err = notifier.deliver(1, &coaching_message()).await.unwrap_err();

        assert!(err.to_string().contains("500"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_custom_headers_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("X-Bot-Token", "abc")
            .with_status(204)
            .create_async()
            .await;

        let headers = HashMap::from([("X-Bot-Token".to_string(), "abc".to_string())]);
        let notifier = create_test_notifier(server.url().as_str(), None, Some(headers));
        notifier.notify_json(&json!({"ping": true})).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_invalid_header_value_fails_before_sending() {
        let server = mockito::Server::new_async().await;
        let headers = HashMap::from([("X-Custom".to_string(), "bad\nvalue".to_string())]);
        let notifier = create_test_notifier(server.url().as_str(), None, Some(headers));

        let err = notifier.notify_json(&json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Invalid header value"));
    }
}
