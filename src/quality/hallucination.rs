/*!
 * Hallucination checks: medical terms the source never mentioned, numbers
 * that drifted and readings no patient could have.
 */

use serde::{Deserialize, Serialize};

use crate::dictionaries::lexicon::QualityLexicon;

/// Risk added per medical term that appears only in the candidate
pub const RISK_PER_ADDED_TERM: f64 = 0.2;
/// Source numbers above this must reappear in the candidate
pub const CHECKED_NUMBER_FLOOR: f64 = 10.0;
/// Allowed relative drift for a carried-over number
pub const NUMBER_TOLERANCE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallucinationCheck {
    pub flagged: bool,
    /// Added terms × 0.2, capped at 1.0
    pub risk: f64,
    /// How far the candidate can be trusted after the checks
    pub confidence: f64,
    pub added_terms: Vec<String>,
    pub issues: Vec<String>,
}

/// Lower-cased medical terms found in `text`, duplicates kept
pub fn extract_terms(lexicon: &QualityLexicon, text: &str) -> Vec<String> {
    lexicon
        .term_extractor
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn numbers(lexicon: &QualityLexicon, text: &str) -> Vec<f64> {
    lexicon
        .numbers
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// A significant source number with no close counterpart in the candidate
pub fn has_numeric_contradiction(lexicon: &QualityLexicon, source: &str, candidate: &str) -> bool {
    let translated = numbers(lexicon, candidate);
    numbers(lexicon, source)
        .into_iter()
        .filter(|n| *n > CHECKED_NUMBER_FLOOR)
        .any(|n| !translated.iter().any(|t| (t - n).abs() / n < NUMBER_TOLERANCE))
}

/// Names of readings outside their plausible range
pub fn impossible_readings(lexicon: &QualityLexicon, candidate: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    for reading in &lexicon.impossible_readings {
        let out_of_range = reading.regex.captures_iter(candidate).any(|caps| {
            caps.get(1)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .is_some_and(|value| value < reading.min || value > reading.max)
        });
        if out_of_range {
            found.push(reading.name);
        }
    }
    found
}

pub fn check_hallucination(
    lexicon: &QualityLexicon,
    source: &str,
    candidate: &str,
    emergency: bool,
    emergency_min_confidence: f64,
) -> HallucinationCheck {
    let source_terms = extract_terms(lexicon, source);
    let added_terms: Vec<String> = extract_terms(lexicon, candidate)
        .into_iter()
        .filter(|term| !source_terms.iter().any(|orig| lexicon.related(orig, term)))
        .collect();

    let mut issues = Vec::new();
    let mut confidence: f64 = 0.9;

    if !added_terms.is_empty() {
        confidence = 0.6;
        issues.push(format!(
            "Added medical terms not in original: {}",
            added_terms.join(", ")
        ));
    }
    if has_numeric_contradiction(lexicon, source, candidate) {
        confidence = confidence.min(0.4);
        issues.push("Contradictory numbers between source and translation".to_string());
    }
    let impossible = impossible_readings(lexicon, candidate);
    if !impossible.is_empty() {
        confidence = confidence.min(0.3);
        issues.push(format!("Physiologically impossible {}", impossible.join(", ")));
    }

    let flagged = !issues.is_empty();
    if emergency && confidence < emergency_min_confidence {
        issues.push("Translation confidence too low for emergency context".to_string());
    }

    HallucinationCheck {
        flagged,
        risk: (added_terms.len() as f64 * RISK_PER_ADDED_TERM).min(1.0),
        confidence,
        added_terms,
        issues,
    }
}
