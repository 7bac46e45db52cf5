//! Integration tests for coaching message delivery.

use mockito::Matcher;
use pulsewatch::{
    config::HttpRetryConfig,
    http_client::HttpClientPool,
    models::{
        CoachingMessage, Severity,
        notifier::{NotifierTypeConfig, WebhookConfig},
    },
    notification::{build_notifier, error::NotificationError},
};
use serde_json::json;
use url::Url;

fn webhook(url: &str, secret: Option<&str>) -> NotifierTypeConfig {
    NotifierTypeConfig::Webhook(WebhookConfig {
        url: Url::parse(url).unwrap(),
        method: None,
        secret: secret.map(str::to_string),
        headers: None,
        retry_policy: HttpRetryConfig::no_retries(),
    })
}

fn message() -> CoachingMessage {
    CoachingMessage {
        burst_text: "this is trash".to_string(),
        tip: "Name the issue, not the person.".to_string(),
        severity: Severity::Medium,
        language: "en".to_string(),
    }
}

#[tokio::test]
async fn test_webhook_delivery_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/coach")
        .match_header("x-signature", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
        .match_body(Matcher::PartialJson(json!({
            "user_id": 77,
            "severity": "medium",
            "language": "en",
            "tip": "Name the issue, not the person.",
        })))
        .with_status(200)
        .create_async()
        .await;

    let pool = HttpClientPool::default();
    let notifier =
        build_notifier(&webhook(&format!("{}/coach", server.url()), Some("s3cret")), &pool)
            .await
            .unwrap();

    notifier.deliver(77, &message()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_rendered_message_quotes_burst() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::Regex(r#"\\"this is trash\\""#.to_string()))
        .with_status(204)
        .create_async()
        .await;

    let pool = HttpClientPool::default();
    let notifier = build_notifier(&webhook(&server.url(), None), &pool).await.unwrap();

    notifier.deliver(1, &message()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_delivery_failure_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", "/").with_status(502).create_async().await;

    let pool = HttpClientPool::default();
    let notifier = build_notifier(&webhook(&server.url(), None), &pool).await.unwrap();

    let result = notifier.deliver(1, &message()).await;
    assert!(matches!(result, Err(NotificationError::NotifyFailed(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_with_non_http_scheme_is_rejected() {
    let pool = HttpClientPool::default();
    let result = build_notifier(&webhook("ftp://files.example.com/drop", None), &pool).await;
    assert!(matches!(result, Err(NotificationError::ConfigError(_))));
}

#[tokio::test]
async fn test_stdout_notifier_delivers() {
    let pool = HttpClientPool::default();
    let notifier = build_notifier(&NotifierTypeConfig::Stdout, &pool).await.unwrap();
    assert!(notifier.deliver(5, &message()).await.is_ok());
}
