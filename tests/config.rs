//! The shipped configuration files load and resolve as documented.

use std::time::Duration;

use pulsewatch::{
    config::AppConfig,
    models::{ClassificationMode, Severity, notifier::NotifierTypeConfig},
    providers::ConsentList,
};

#[test]
fn test_shipped_app_config_loads() {
    let config = AppConfig::new(Some("configs")).unwrap();

    assert_eq!(config.harm.debounce_interval, Duration::from_millis(1200));
    assert_eq!(config.harm.max_burst_duration, Duration::from_secs(8));
    assert_eq!(config.harm.max_combined_chars, 500);
    assert_eq!(config.harm.cooldown_interval, Duration::from_secs(600));
    assert_eq!(config.harm.mode, ClassificationMode::Hybrid);
    assert_eq!(config.harm.min_severity, Severity::Medium);
    assert!(config.harm.arabic_dialect);
    assert!(config.require_consent);
    assert!(config.azure.is_none());
    assert!(matches!(config.notifier, NotifierTypeConfig::Stdout));
    assert!(config.consent_config_path.ends_with("consent.yaml"));
}

#[test]
fn test_shipped_consent_list_loads() {
    let config = AppConfig::new(Some("configs")).unwrap();
    let consent = ConsentList::from_file(&config.consent_config_path).unwrap();
    assert!(consent.is_empty());
}
