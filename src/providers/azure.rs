//! Azure OpenAI chat-completions client.
//!
//! One client serves as both the remote [`Classifier`] and the remote
//! [`Responder`]. Transient HTTP failures are retried by the pooled client;
//! everything else surfaces as a [`ProviderError`] for the caller to fall
//! back on.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    error::ProviderError,
    traits::{Classifier, ClassifierError, Responder, ResponderError},
};
use crate::{
    engine::text::ellipsize,
    http_client::HttpClientPool,
    models::{Severity, UNDETERMINED_LANGUAGE, Verdict, notifier::AzureOpenAiConfig},
};

const CLASSIFIER_SYSTEM_PROMPT: &str = "Return strict JSON only.";
const COACH_SYSTEM_PROMPT: &str = "You are a calm, multilingual workplace communication coach.";
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an Azure OpenAI chat deployment.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    url: String,
    api_key: String,
    client: Arc<ClientWithMiddleware>,
}

impl AzureOpenAiClient {
    /// Creates a client over `http_client`.
    pub fn new(config: &AzureOpenAiConfig, http_client: Arc<ClientWithMiddleware>) -> Self {
        Self { url: config.completions_url(), api_key: config.api_key.clone(), client: http_client }
    }

    /// Creates a client, drawing its HTTP client from `pool`.
    pub async fn from_pool(
        config: &AzureOpenAiConfig,
        pool: &HttpClientPool,
    ) -> Result<Self, ProviderError> {
        let client = pool.get_or_create(&config.retry_policy).await?;
        Ok(Self::new(config, client))
    }

    /// Sends one system + user exchange and returns the assistant's reply.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status,
                body: ellipsize(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".into()))
    }
}

fn classification_prompt(text: &str, context: &[String]) -> String {
    format!(
        "You are a multilingual moderation classifier. Decide whether the message is \
         aggressive, harassing or toxic in its own language. Insulting a person \
         (calling them 'fat', 'stupid' and so on) counts as harmful. Return ONLY JSON \
         with keys: is_harmful (boolean), severity (low|medium|high), language (ISO \
         code), reason (short).\n\nContext (oldest first):\n{}\n\nMessage:\n{text}",
        context.join("\n")
    )
}

fn coaching_prompt(text: &str, language: &str) -> String {
    format!(
        "The following workplace chat message reads as emotionally aggressive. Reply \
         with a SHORT (1-2 sentences) empathetic suggestion to calm down and rephrase \
         constructively, in the same language as the message (language hint: \
         {language}). Be kind and practical, never judgmental.\n\nMessage:\n{text}"
    )
}

/// Parses `raw` as JSON, falling back to the outermost `{...}` block when the
/// model wrapped its answer in prose or code fences.
fn extract_json_object(raw: &str) -> Option<serde_json::Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str(raw) {
        return Some(map);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&raw[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Turns the model's reply into a [`Verdict`]. Missing fields take
/// `false`/`low`/`und`/`""`; an unrecognised severity is rejected.
fn parse_verdict(raw: &str) -> Result<Verdict, ProviderError> {
    let map = extract_json_object(raw).ok_or_else(|| {
        ProviderError::MalformedResponse(format!("no JSON object in reply: {}", ellipsize(raw, 80)))
    })?;

    let is_harmful = map.get("is_harmful").and_then(Value::as_bool).unwrap_or(false);
    let severity = match map.get("severity") {
        None | Some(Value::Null) => Severity::Low,
        Some(Value::String(s)) => s
            .parse::<Severity>()
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?,
        Some(other) => {
            return Err(ProviderError::MalformedResponse(format!(
                "severity is not a string: {other}"
            )));
        }
    };
    let language = map
        .get("language")
        .and_then(Value::as_str)
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string());
    let reason = map.get("reason").and_then(Value::as_str).unwrap_or_default().to_string();

    Ok(Verdict { is_harmful, severity, language, reason })
}

#[async_trait]
impl Classifier for AzureOpenAiClient {
    async fn classify(&self, text: &str, context: &[String]) -> Result<Verdict, ClassifierError> {
        let reply =
            self.chat(CLASSIFIER_SYSTEM_PROMPT, &classification_prompt(text, context), 0.0, 140).await?;
        Ok(parse_verdict(&reply)?)
    }
}

#[async_trait]
impl Responder for AzureOpenAiClient {
    async fn compose_tip(&self, text: &str, language: &str) -> Result<String, ResponderError> {
        let reply = self.chat(COACH_SYSTEM_PROMPT, &coaching_prompt(text, language), 0.7, 120).await?;
        let tip = reply.trim();
        if tip.is_empty() {
            return Err(ResponderError::EmptyTip);
        }
        Ok(tip.to_string())
    }
}
