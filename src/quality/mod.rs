/*!
 * Quality assessment of candidate translations.
 *
 * Scores a candidate against its source, decides whether a human has to
 * look at it and at what priority, and lists the issues a reviewer should
 * see. A candidate that cannot be assessed gets conservative fallback
 * metrics and is always sent to review.
 */

pub mod bias;
pub mod hallucination;
pub mod metrics;

use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::app_config::QualityConfig;
use crate::dictionaries::TermLibrary;
use crate::dictionaries::lexicon::QualityLexicon;
use crate::models::{MedicalContext, Priority};

pub use bias::{BiasCheck, BiasSeverity};
pub use hallucination::HallucinationCheck;
pub use metrics::{QualityMetrics, QualityWeights};

/// Everything the decision step and a review request need
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub metrics: QualityMetrics,
    pub requires_review: bool,
    pub priority: Priority,
    pub flagged_issues: Vec<String>,
    pub bias: Option<BiasCheck>,
    pub hallucination: Option<HallucinationCheck>,
    /// False when the fallback metrics were used
    pub assessed: bool,
}

#[derive(Debug, Clone)]
pub struct QualityAssessor {
    library: Arc<TermLibrary>,
    config: QualityConfig,
    weights: QualityWeights,
}

/// Fraction of source medical terms with an identical or related term in the candidate
pub fn term_coverage(lexicon: &QualityLexicon, source: &str, candidate: &str) -> f64 {
    let source_terms = hallucination::extract_terms(lexicon, source);
    if source_terms.is_empty() {
        return 1.0;
    }
    let candidate_terms = hallucination::extract_terms(lexicon, candidate);
    let kept = source_terms
        .iter()
        .filter(|term| candidate_terms.iter().any(|c| lexicon.related(term, c)))
        .count();
    kept as f64 / source_terms.len() as f64
}

pub fn cultural_score(lexicon: &QualityLexicon, candidate: &str) -> f64 {
    if lexicon.disrespectful.iter().any(|re| re.is_match(candidate)) {
        0.6
    } else {
        0.9
    }
}

/// Every urgency word in the source survives, directly or as a synonym
pub fn urgency_preserved(lexicon: &QualityLexicon, source: &str, candidate: &str) -> bool {
    let source = source.to_lowercase();
    let candidate = candidate.to_lowercase();
    lexicon
        .urgency_keywords
        .iter()
        .filter(|keyword| source.contains(*keyword))
        .all(|keyword| lexicon.equivalents(keyword).iter().any(|eq| candidate.contains(eq)))
}

/// Whether a human must review the candidate
pub fn requires_review(
    config: &QualityConfig,
    metrics: &QualityMetrics,
    bias: &BiasCheck,
    hallucination_flagged: bool,
    context: MedicalContext,
) -> bool {
    if context.is_emergency()
        && (metrics.overall_quality < config.emergency_review_below
            || !metrics.emergency_urgency_preserved
            || hallucination_flagged
            || bias.detected)
    {
        return true;
    }
    (bias.detected && bias.severity == BiasSeverity::High)
        || hallucination_flagged
        || metrics.overall_quality < config.review_below
        || metrics.medical_accuracy < config.medical_accuracy_review_below
}

/// Review priority, first matching rule wins
pub fn review_priority(
    config: &QualityConfig,
    metrics: &QualityMetrics,
    bias_severity: BiasSeverity,
    hallucination_flagged: bool,
    context: MedicalContext,
) -> Priority {
    if context.is_emergency() {
        if hallucination_flagged || metrics.overall_quality < config.critical_priority_below {
            return Priority::Critical;
        }
        return Priority::High;
    }
    if bias_severity == BiasSeverity::High {
        Priority::High
    } else if hallucination_flagged || metrics.overall_quality < config.medium_priority_below {
        Priority::Medium
    } else {
        Priority::Low
    }
}

impl QualityAssessor {
    pub fn new(library: Arc<TermLibrary>, config: QualityConfig) -> Self {
        let weights = QualityWeights::from(&config);
        Self {
            library,
            config,
            weights,
        }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    pub fn assess(
        &self,
        source: &str,
        candidate: &str,
        source_language: &str,
        target_language: &str,
        context: MedicalContext,
    ) -> QualityAssessment {
        match self.try_assess(source, candidate, context) {
            Ok(assessment) => {
                debug!(
                    "Quality {} -> {}: overall={:.2}, review={}, priority={}",
                    source_language,
                    target_language,
                    assessment.metrics.overall_quality,
                    assessment.requires_review,
                    assessment.priority
                );
                assessment
            }
            Err(reason) => {
                warn!(
                    "Quality assessment failed for {} -> {}: {}",
                    source_language, target_language, reason
                );
                self.fallback(context, reason)
            }
        }
    }

    fn try_assess(&self, source: &str, candidate: &str, context: MedicalContext) -> Result<QualityAssessment, String> {
        if candidate.trim().is_empty() {
            return Err("empty candidate translation".to_string());
        }
        if source.trim().is_empty() {
            return Err("empty source text".to_string());
        }

        let lexicon = &self.library.quality;
        let emergency = context.is_emergency();

        let terminology = term_coverage(lexicon, source, candidate);
        let cultural = cultural_score(lexicon, candidate);
        let urgency = !emergency || urgency_preserved(lexicon, source, candidate);
        let confidence = metrics::length_confidence(source, candidate);
        let bias = bias::check_bias(lexicon, source, candidate);
        let hallucination = hallucination::check_hallucination(
            lexicon,
            source,
            candidate,
            emergency,
            self.config.emergency_min_confidence,
        );

        let overall = self.weights.overall(
            confidence,
            terminology,
            cultural,
            terminology,
            bias.score,
            hallucination.risk,
        );
        let metrics = QualityMetrics {
            confidence,
            medical_accuracy: terminology,
            cultural_appropriateness: cultural,
            emergency_urgency_preserved: urgency,
            terminology_consistency: terminology,
            bias_score: bias.score,
            hallucination_risk: hallucination.risk,
            overall_quality: overall,
        };
        if !metrics.is_finite() {
            return Err("non-finite quality score".to_string());
        }

        let requires_review = requires_review(&self.config, &metrics, &bias, hallucination.flagged, context);
        let priority = review_priority(&self.config, &metrics, bias.severity, hallucination.flagged, context);

        let mut flagged_issues = Vec::new();
        if bias.detected {
            let kinds: Vec<String> = bias.kinds.iter().map(|k| k.to_string()).collect();
            flagged_issues.push(format!("Bias detected: {}", kinds.join(", ")));
        }
        if hallucination.flagged {
            flagged_issues.push(format!("Hallucination risk: {}", hallucination.issues.join(", ")));
        }
        if metrics.overall_quality < self.config.review_below {
            flagged_issues.push("Low overall quality score".to_string());
        }
        if emergency && !metrics.emergency_urgency_preserved {
            flagged_issues.push("Emergency urgency not preserved".to_string());
        }

        Ok(QualityAssessment {
            metrics,
            requires_review,
            priority,
            flagged_issues,
            bias: Some(bias),
            hallucination: Some(hallucination),
            assessed: true,
        })
    }

    fn fallback(&self, context: MedicalContext, reason: String) -> QualityAssessment {
        let metrics = QualityMetrics::fallback();
        QualityAssessment {
            priority: review_priority(&self.config, &metrics, BiasSeverity::Low, false, context),
            metrics,
            requires_review: true,
            flagged_issues: vec![format!("Quality assessment unavailable: {}", reason)],
            bias: None,
            hallucination: None,
            assessed: false,
        }
    }
}
