/*!
 * Final outcome for a translated request.
 *
 * Folds the redaction's manual-review trigger and the quality assessment's
 * review trigger into one tagged value, so the gateway has a single place
 * that decides between delivering and holding.
 */

use serde::Serialize;

use crate::models::Priority;
use crate::phi::{RedactionResult, RiskLevel};
use crate::quality::QualityAssessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "priority", rename_all = "snake_case")]
pub enum Outcome {
    /// No sensitive data and no quality concern
    Deliver,
    /// Sensitive data was masked; the masked translation is safe to deliver
    RedactAndDeliver,
    /// A human must review before anything is delivered
    Hold(Priority),
}

impl Outcome {
    pub fn is_hold(&self) -> bool {
        matches!(self, Self::Hold(_))
    }
}

/// Review priority implied by the privacy risk alone
pub fn phi_priority(risk: RiskLevel) -> Priority {
    match risk {
        RiskLevel::Critical => Priority::High,
        RiskLevel::High => Priority::Medium,
        RiskLevel::Medium | RiskLevel::Low => Priority::Low,
    }
}

pub fn decide(redaction: &RedactionResult, quality: &QualityAssessment) -> Outcome {
    if redaction.requires_manual_review || quality.requires_review {
        Outcome::Hold(quality.priority.max(phi_priority(redaction.risk_level)))
    } else if redaction.has_phi() {
        Outcome::RedactAndDeliver
    } else {
        Outcome::Deliver
    }
}
