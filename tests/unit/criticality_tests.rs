/*!
 * Tests for criticality scoring through the public API
 */

use lifebridge::app_config::CriticalityConfig;
use lifebridge::criticality::{CriticalityAnalyzer, MAX_SCORE, ModifierContext};
use lifebridge::dictionaries::TermLibrary;
use lifebridge::models::MedicalContext;

fn analyzer() -> CriticalityAnalyzer {
    CriticalityAnalyzer::new(TermLibrary::builtin().shared(), CriticalityConfig::default())
}

const CHEST_PAIN: &str = "Severe crushing chest pain radiating to left arm";

#[test]
fn test_analyze_withChestPain_shouldIncludeBonusAndCriticalBase() {
    let config = CriticalityConfig::default();
    let result = analyzer().analyze(CHEST_PAIN);

    assert!(result.is_emergency);
    assert_eq!(result.recommended_context, MedicalContext::Emergency);
    assert!(result.detected_terms.contains(&"chest pain".to_string()));
    assert!(result.criticality_score >= config.base_critical + config.emergency_keyword_bonus);
}

#[test]
fn test_analyze_withChronicPrefix_shouldScoreStrictlyLower() {
    let a = analyzer();
    let neutral = a.analyze(CHEST_PAIN);
    let chronic = a.analyze(&format!("I have chronic {}", CHEST_PAIN.to_lowercase()));

    assert_eq!(chronic.modifier_context, ModifierContext::Chronic);
    assert!(!chronic.is_emergency);
    assert!(chronic.criticality_score < neutral.criticality_score);
}

#[test]
fn test_analyze_withPainQualityWords_shouldBeAcuteAndScaleUp() {
    let a = analyzer();
    let plain = a.analyze("nausea after lunch");
    let intense = a.analyze("intense nausea after lunch");

    assert_eq!(plain.modifier_context, ModifierContext::Neutral);
    assert_eq!(intense.modifier_context, ModifierContext::Acute);
    assert_eq!(intense.criticality_score, 12);
    assert!(intense.criticality_score > plain.criticality_score);
    assert_eq!(a.analyze("unbearable stabbing ache").modifier_context, ModifierContext::Acute);
}

#[test]
fn test_analyze_scores_shouldStayWithinBounds() {
    let a = analyzer();
    let texts = [
        "",
        "hello there",
        "chronic mild headache",
        CHEST_PAIN,
        "sudden seizure, stroke, unconscious, bleeding, overdose, allergic reaction, chest pain, insulin, epinephrine",
    ];
    for text in texts {
        let result = a.analyze(text);
        assert!(result.criticality_score <= MAX_SCORE, "text: {}", text);
        assert_eq!(result.contains_medical, !result.detected_terms.is_empty());
    }
}

#[test]
fn test_analyze_isCaseInsensitive() {
    let a = analyzer();
    let lower = a.analyze("chest pain");
    let upper = a.analyze("CHEST PAIN");
    assert_eq!(lower.detected_terms, upper.detected_terms);
    assert_eq!(lower.criticality_score, upper.criticality_score);
}

#[test]
fn test_analyze_withCustomWeights_shouldUseConfiguredBonus() {
    let config = CriticalityConfig {
        emergency_keyword_bonus: 0,
        ..CriticalityConfig::default()
    };
    let quiet = CriticalityAnalyzer::new(TermLibrary::builtin().shared(), config);
    let with_bonus = analyzer().analyze(CHEST_PAIN).criticality_score;
    assert_eq!(quiet.analyze(CHEST_PAIN).criticality_score + 20, with_bonus);
}
