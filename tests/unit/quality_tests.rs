/*!
 * Quality assessment through the public API
 */

use lifebridge::app_config::QualityConfig;
use lifebridge::dictionaries::TermLibrary;
use lifebridge::models::{MedicalContext, Priority};
use lifebridge::quality::QualityAssessor;

fn assessor() -> QualityAssessor {
    QualityAssessor::new(TermLibrary::builtin().shared(), QualityConfig::default())
}

#[test]
fn test_assess_withAddedMedicalTerm_shouldFlagHallucinationAndReview() {
    let a = assessor().assess(
        "I have a headache",
        "[es] I have a headache with fever",
        "en",
        "es",
        MedicalContext::General,
    );

    let hallucination = a.hallucination.as_ref().unwrap();
    assert!(hallucination.flagged);
    assert_eq!(hallucination.added_terms, vec!["fever".to_string()]);
    assert!((a.metrics.hallucination_risk - 0.2).abs() < 1e-9);
    assert!(a.requires_review);
    assert_eq!(a.priority, Priority::Medium);
    assert!(a.flagged_issues.iter().any(|i| i.starts_with("Hallucination risk:")));
}

#[test]
fn test_assess_withSameCandidateInEmergency_shouldRaisePriorityToCritical() {
    let a = assessor().assess(
        "I have a headache",
        "[es] I have a headache with fever",
        "en",
        "es",
        MedicalContext::Emergency,
    );
    assert!(a.requires_review);
    assert_eq!(a.priority, Priority::Critical);
}

#[test]
fn test_assess_withImpossibleReading_shouldReportIt() {
    let a = assessor().assess(
        "temperature 38 °C",
        "temperature 83 °C",
        "en",
        "es",
        MedicalContext::General,
    );

    let hallucination = a.hallucination.as_ref().unwrap();
    assert!(hallucination.flagged);
    assert!(hallucination.added_terms.is_empty());
    assert!(hallucination.issues.iter().any(|i| i == "Physiologically impossible temperature (C)"));
    assert!(hallucination.issues.iter().any(|i| i.starts_with("Contradictory numbers")));
    assert!(hallucination.confidence <= 0.3);
    assert!(a.requires_review);
}

#[test]
fn test_assess_withSynonymUrgencyWord_shouldPreserveUrgency() {
    let a = assessor().assess(
        "Help, severe pain",
        "Help, severe ache",
        "en",
        "es",
        MedicalContext::Emergency,
    );
    assert!(a.metrics.emergency_urgency_preserved);
    assert!(!a.flagged_issues.contains(&"Emergency urgency not preserved".to_string()));
}

#[test]
fn test_assess_withCustomWeights_shouldUseConfiguredComposite() {
    let config = QualityConfig {
        weight_confidence: 1.0,
        weight_medical_accuracy: 0.0,
        weight_cultural: 0.0,
        weight_terminology: 0.0,
        weight_bias: 0.0,
        weight_hallucination: 0.0,
        ..QualityConfig::default()
    };
    let custom = QualityAssessor::new(TermLibrary::builtin().shared(), config);

    let a = custom.assess("I have a headache", "[es] I have a headache", "en", "es", MedicalContext::General);
    assert!((a.metrics.overall_quality - 0.8).abs() < 1e-9);

    let default = assessor().assess("I have a headache", "[es] I have a headache", "en", "es", MedicalContext::General);
    assert!((default.metrics.overall_quality - 0.795).abs() < 1e-9);
}

#[test]
fn test_assess_withEmptySource_shouldFallBack() {
    let a = assessor().assess("  ", "algo", "en", "es", MedicalContext::General);
    assert!(!a.assessed);
    assert!(a.requires_review);
    assert!(a.bias.is_none());
    assert!(a.flagged_issues[0].starts_with("Quality assessment unavailable"));
}
