/*!
 * Properties of the PHI detector: idempotence, determinism, monotonicity
 */

use lifebridge::app_config::RedactionConfig;
use lifebridge::dictionaries::TermLibrary;
use lifebridge::dictionaries::patterns::Severity;
use lifebridge::models::MedicalContext;
use lifebridge::phi::{PhiDetector, RedactionSettings, RiskLevel};

fn detector() -> PhiDetector {
    PhiDetector::new(TermLibrary::builtin().shared(), RedactionSettings::default())
}

const SAMPLES: &[&str] = &[
    "My SSN is 123-45-6789",
    "Call me at 555-123-4567 or mail jane.doe@example.org",
    "Patient ID: 998877, DOB: 01/02/1980, lives at 42 Elm Street",
    "Card 4111 1111 1111 1111 and Insurance ID: AB12345",
    "I have a headache",
    "",
];

#[test]
fn test_redact_withSsn_shouldBeCriticalAndRequireReview() {
    let result = detector().redact("My SSN is 123-45-6789", MedicalContext::General);

    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].pattern_name, "SSN");
    assert_eq!(result.matches[0].severity, Severity::Critical);
    assert_eq!(result.risk_level, RiskLevel::Critical);
    assert!(result.requires_manual_review);
    assert!(result.compliance_score <= 0.6);
    assert_eq!(result.redacted_text, "My SSN is [SSN-REDACTED]");
}

#[test]
fn test_redact_onRedactedText_shouldChangeNothing() {
    let d = detector();
    for context in [MedicalContext::General, MedicalContext::Consultation, MedicalContext::Medication] {
        for text in SAMPLES {
            let once = d.redact(text, context);
            let twice = d.redact(&once.redacted_text, context);
            assert_eq!(twice.redacted_text, once.redacted_text, "text: {}", text);
            assert!(twice.matches.is_empty(), "text: {}", text);
        }
    }
}

#[test]
fn test_redact_sameInput_shouldBeDeterministic() {
    let d = detector();
    for text in SAMPLES {
        let a = d.redact(text, MedicalContext::General);
        let b = d.redact(text, MedicalContext::General);
        assert_eq!(a.matches, b.matches);
        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.compliance_score, b.compliance_score);
        assert_eq!(a.redacted_text, b.redacted_text);
    }
}

#[test]
fn test_redact_addingCriticalMatches_shouldNeverLowerRisk() {
    let d = detector();
    for base in SAMPLES {
        let before = d.redact(base, MedicalContext::General);
        let after = d.redact(&format!("{} SSN 123-45-6789", base), MedicalContext::General);

        assert!(after.risk_level >= before.risk_level, "base: {}", base);
        assert_eq!(after.risk_level, RiskLevel::Critical);
        if before.requires_manual_review {
            assert!(after.requires_manual_review);
        }
        assert!(after.compliance_score <= before.compliance_score);
    }
}

#[test]
fn test_redact_scores_shouldStayInUnitInterval() {
    let d = detector();
    let heavy = "SSN 123-45-6789, SSN 987-65-4321, MRN 12345, card 4111 1111 1111 1111";
    for context in [MedicalContext::Emergency, MedicalContext::General] {
        let result = d.redact(heavy, context);
        assert!((0.0..=1.0).contains(&result.compliance_score));
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }
}

#[test]
fn test_redact_inEmergency_shouldKeepNamesAndAppendNotice() {
    let d = detector();
    let text = "John Smith has chest pain, call 555-123-4567";

    let emergency = d.redact(text, MedicalContext::Emergency);
    assert!(emergency.redacted_text.contains("John Smith"));
    assert!(emergency.redacted_text.contains("[PHONE-REDACTED]"));
    assert!(emergency.redacted_text.len() > text.len());

    let general = d.redact(text, MedicalContext::General);
    assert!(!general.redacted_text.contains("John Smith"));
}

#[test]
fn test_redact_withRedactionDisabled_shouldStillDetect() {
    let config = RedactionConfig {
        enable_redaction: false,
        ..RedactionConfig::default()
    };
    let d = PhiDetector::new(TermLibrary::builtin().shared(), RedactionSettings::from(&config));

    let result = d.redact("Call 555-123-4567", MedicalContext::General);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.risk_level, RiskLevel::High);
}

#[test]
fn test_riskReport_shouldGroupByCategoryAndSeverity() {
    let report = detector().risk_report(
        "SSN 123-45-6789, call 555-123-4567",
        MedicalContext::General,
    );
    assert_eq!(report.total, 2);
    assert_eq!(report.by_severity.get("critical"), Some(&1));
    assert_eq!(report.by_severity.get("high"), Some(&1));
    assert_eq!(report.risk_level, RiskLevel::Critical);
    assert!(report.assessment.starts_with("Critical privacy risk"));
}

#[test]
fn test_validateSafety_withCleanText_shouldBeSafe() {
    let safety = detector().validate_safety("I have a headache", MedicalContext::General);
    assert!(safety.is_safe);
    assert!(safety.issues.is_empty());
}
