/*!
 * Quality metrics for a candidate translation.
 *
 * Dimensions:
 * - Confidence: length ratio between source and candidate
 * - Medical accuracy / terminology: medical terms carried over
 * - Cultural appropriateness: no disrespectful wording
 * - Urgency: urgency words survive in emergency context
 * - Bias and hallucination risk, subtracted from the composite
 */

use serde::{Deserialize, Serialize};

use crate::app_config::QualityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub confidence: f64,
    pub medical_accuracy: f64,
    pub cultural_appropriateness: f64,
    pub emergency_urgency_preserved: bool,
    pub terminology_consistency: f64,
    pub bias_score: f64,
    pub hallucination_risk: f64,
    pub overall_quality: f64,
}

/// Composite weights, all non-negative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityWeights {
    pub confidence: f64,
    pub medical_accuracy: f64,
    pub cultural: f64,
    pub terminology: f64,
    pub bias: f64,
    pub hallucination: f64,
}

impl From<&QualityConfig> for QualityWeights {
    fn from(config: &QualityConfig) -> Self {
        Self {
            confidence: config.weight_confidence,
            medical_accuracy: config.weight_medical_accuracy,
            cultural: config.weight_cultural,
            terminology: config.weight_terminology,
            bias: config.weight_bias,
            hallucination: config.weight_hallucination,
        }
    }
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self::from(&QualityConfig::default())
    }
}

impl QualityWeights {
    /// Weighted composite, clamped to [0, 1]
    pub fn overall(
        &self,
        confidence: f64,
        medical_accuracy: f64,
        cultural: f64,
        terminology: f64,
        bias_score: f64,
        hallucination_risk: f64,
    ) -> f64 {
        let score = confidence * self.confidence
            + medical_accuracy * self.medical_accuracy
            + cultural * self.cultural
            + terminology * self.terminology
            - bias_score * self.bias
            - hallucination_risk * self.hallucination;
        score.clamp(0.0, 1.0)
    }
}

impl QualityMetrics {
    /// Conservative values used when a candidate could not be assessed
    pub fn fallback() -> Self {
        Self {
            confidence: 0.5,
            medical_accuracy: 0.5,
            cultural_appropriateness: 0.5,
            emergency_urgency_preserved: false,
            terminology_consistency: 0.5,
            bias_score: 0.5,
            hallucination_risk: 0.8,
            overall_quality: 0.3,
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.confidence,
            self.medical_accuracy,
            self.cultural_appropriateness,
            self.terminology_consistency,
            self.bias_score,
            self.hallucination_risk,
            self.overall_quality,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// 0.8 when the candidate is between half and twice the source length
pub fn length_confidence(source: &str, candidate: &str) -> f64 {
    let source_len = source.chars().count();
    if source_len == 0 {
        return 0.6;
    }
    let ratio = candidate.chars().count() as f64 / source_len as f64;
    if (0.5..=2.0).contains(&ratio) { 0.8 } else { 0.6 }
}
