/*!
 * Demographic bias detection in candidate translations.
 */

use serde::{Deserialize, Serialize};

use crate::dictionaries::lexicon::{BiasKind, QualityLexicon};

/// Points added per scored bias indicator
pub const BIAS_POINTS_PER_INDICATOR: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasSeverity {
    /// Nothing detected
    Low,
    Medium,
    /// Bias in a message about pain or an emergency
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasCheck {
    pub detected: bool,
    pub kinds: Vec<BiasKind>,
    pub severity: BiasSeverity,
    /// Scored indicators × 0.3, capped at 1.0
    pub score: f64,
    pub suggestions: Vec<String>,
}

pub fn check_bias(lexicon: &QualityLexicon, source: &str, candidate: &str) -> BiasCheck {
    let mut kinds = Vec::new();
    let mut scored = 0usize;
    for pattern in &lexicon.bias {
        if pattern.regex.is_match(candidate) {
            if !kinds.contains(&pattern.kind) {
                kinds.push(pattern.kind);
            }
            if pattern.scored {
                scored += 1;
            }
        }
    }

    let detected = !kinds.is_empty();
    let lowered = source.to_lowercase();
    let severity = if !detected {
        BiasSeverity::Low
    } else if lowered.contains("pain") || lowered.contains("emergency") {
        BiasSeverity::High
    } else {
        BiasSeverity::Medium
    };

    let suggestions = if detected {
        kinds
            .iter()
            .map(|kind| match kind {
                BiasKind::Gender => "Use gender-neutral wording for clinical roles".to_string(),
                BiasKind::Cultural => "Check the cultural sensitivity of descriptive terms".to_string(),
                BiasKind::Age => "Describe symptoms without age stereotypes".to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    BiasCheck {
        detected,
        kinds,
        severity,
        score: (scored as f64 * BIAS_POINTS_PER_INDICATOR).min(1.0),
        suggestions,
    }
}
