/*!
 * Tests for gateway configuration loading and validation
 */

use std::fs;
use tempfile::TempDir;

use lifebridge::app_config::Config;
use lifebridge::dictionaries::TermLibrary;
use lifebridge::models::{MedicalContext, PerformanceMode};
use lifebridge::phi::{PhiDetector, RedactionSettings, RiskLevel};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.gateway.max_text_chars, 5000);
    assert!(!config.gateway.share_unreviewed_candidate);
    assert_eq!(config.routing.default_mode, None::<PerformanceMode>);
    assert!((config.quality.review_below - 0.7).abs() < f64::EPSILON);
    assert!((config.quality.emergency_review_below - 0.9).abs() < f64::EPSILON);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_withBadLanguagesOrEndpoint_shouldFail() {
    let mut config = Config::default();

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "es".to_string();

    config.providers.endpoint = "not an endpoint".to_string();
    assert!(config.validate().is_err());
    config.providers.endpoint = "http://localhost:11434".to_string();

    config.routing.very_long_text_chars = config.routing.long_text_chars - 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization_shouldSurviveJsonRoundTrip() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.gateway.max_text_chars, config.gateway.max_text_chars);
    assert_eq!(parsed.providers.fast_model, config.providers.fast_model);
    assert_eq!(parsed.criticality.base_critical, config.criticality.base_critical);
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_config_fromFile_withCustomPattern_shouldRedactSiteIdentifiers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    fs::write(
        &path,
        r#"{
            "target_language": "es",
            "redaction": {
                "custom_patterns": [
                    {
                        "name": "Staff Code",
                        "pattern": "\\bKX-\\d{4}\\b",
                        "replacement": "[STAFF-REDACTED]",
                        "severity": "high",
                        "category": "identifier"
                    }
                ]
            }
        }"#,
    )
    .unwrap();

    let config: Config = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(config.validate().is_ok());
    assert!(config.redaction.enable_redaction);

    let library = TermLibrary::with_custom_patterns(&config.redaction.custom_patterns)
        .unwrap()
        .shared();
    let detector = PhiDetector::new(library, RedactionSettings::from(&config.redaction));
    let result = detector.redact("staff code KX-7781 on duty", MedicalContext::General);

    assert_eq!(result.redacted_text, "staff code [STAFF-REDACTED] on duty");
    assert_eq!(result.risk_level, RiskLevel::High);
}

#[test]
fn test_config_withInvalidCustomPattern_shouldFailValidation() {
    let config: Config = serde_json::from_str(
        r#"{
            "redaction": {
                "custom_patterns": [
                    { "name": "Broken", "pattern": "(", "replacement": "[X]", "severity": "low", "category": "contact" }
                ]
            }
        }"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}
