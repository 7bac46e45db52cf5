//! `pulsewatch classify`: evaluates a single text with the configured gate
//! and prints the verdict, without delivering anything.

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use crate::{
    config::AppConfig,
    engine::classification::ClassificationGate,
    http_client::HttpClientPool,
    metrics::PipelineMetrics,
    models::{ClassificationMode, Verdict},
    providers::{AzureOpenAiClient, Classifier, ProviderError},
};

/// Errors raised by the classify command.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    /// The remote classifier could not be created.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    /// A configured keyword produced an invalid pattern.
    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// The report could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Arguments of `pulsewatch classify`.
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// The text to classify.
    #[arg(short, long)]
    text: String,
    /// Overrides the configured classification mode
    /// (`remote-only`, `heuristic-only`, `hybrid`).
    #[arg(short, long)]
    mode: Option<ClassificationMode>,
    /// Directory holding `app.yaml`. Defaults to `configs`.
    #[arg(short, long)]
    config_dir: Option<String>,
}

/// What the classify command prints.
#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    /// The mode the gate ran in.
    pub mode: ClassificationMode,
    /// The gate's verdict.
    pub verdict: Verdict,
    /// Whether the verdict would trigger a coaching message.
    pub qualifies: bool,
    /// What the local heuristic matched, regardless of mode.
    pub heuristic_signal: Option<String>,
}

/// Classifies `text` the way the running service would.
pub async fn classify_text(
    config: &AppConfig,
    classifier: Option<Arc<dyn Classifier>>,
    mode: Option<ClassificationMode>,
    text: &str,
) -> Result<ClassifyReport, Error> {
    let mut gate =
        ClassificationGate::new(&config.harm, classifier, Arc::new(PipelineMetrics::default()))?;
    if let Some(mode) = mode {
        gate = gate.with_mode(mode);
    }

    let verdict = gate.evaluate(text, &[]).await;
    Ok(ClassifyReport {
        mode: gate.mode(),
        qualifies: gate.qualifies(&verdict),
        heuristic_signal: gate.heuristic().detect(text).map(|s| s.to_string()),
        verdict,
    })
}

/// Entry point of the `classify` subcommand.
pub async fn execute(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::new(args.config_dir.as_deref())?;

    let classifier = match &config.azure {
        Some(azure) => {
            let pool = HttpClientPool::new(config.http_base_config.clone());
            Some(Arc::new(AzureOpenAiClient::from_pool(azure, &pool).await?) as Arc<dyn Classifier>)
        }
        None => None,
    };

    let report = classify_text(&config, classifier, args.mode, &args.text).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Severity,
        providers::{ClassifierError, MockClassifier},
    };

    #[tokio::test]
    async fn test_heuristic_only_reports_signal() {
        let config = AppConfig::default();
        let report = classify_text(
            &config,
            None,
            Some(ClassificationMode::HeuristicOnly),
            "you are such an idiot",
        )
        .await
        .unwrap();

        assert_eq!(report.mode, ClassificationMode::HeuristicOnly);
        assert!(report.verdict.is_harmful);
        assert!(report.qualifies);
        assert!(report.heuristic_signal.is_some());
    }

    #[tokio::test]
    async fn test_remote_only_without_classifier_falls_back() {
        let config = AppConfig::default();
        let report =
            classify_text(&config, None, Some(ClassificationMode::RemoteOnly), "you idiot")
                .await
                .unwrap();

        assert_eq!(report.verdict, Verdict::conservative());
        assert!(!report.qualifies);
    }

    #[tokio::test]
    async fn test_low_severity_remote_verdict_does_not_qualify() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().returning(|_, _| {
            Ok::<_, ClassifierError>(Verdict {
                is_harmful: true,
                severity: Severity::Low,
                language: "en".into(),
                reason: "mild".into(),
            })
        });

        let report = classify_text(
            &AppConfig::default(),
            Some(Arc::new(classifier)),
            Some(ClassificationMode::RemoteOnly),
            "meh, whatever",
        )
        .await
        .unwrap();

        assert!(report.verdict.is_harmful);
        assert!(!report.qualifies);
        assert_eq!(report.heuristic_signal, None);
    }
}
