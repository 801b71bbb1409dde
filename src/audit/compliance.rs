/*!
 * Compliance rules evaluated on every audit event.
 */

use serde::Serialize;
use std::fmt;

use super::{AuditEvent, AuditResult};

/// Emergency responses slower than this are reported
pub const EMERGENCY_RESPONSE_LIMIT_MS: u64 = 30_000;
/// Emergency translations scoring below this are reported
pub const EMERGENCY_MIN_QUALITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceViolation {
    PhiDetected,
    EmergencyResponseSlow,
    EmergencyLowQuality,
    EmergencyTranslationFailure,
}

impl ComplianceViolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhiDetected => "PHI_DETECTED",
            Self::EmergencyResponseSlow => "EMERGENCY_RESPONSE_SLOW",
            Self::EmergencyLowQuality => "EMERGENCY_LOW_QUALITY",
            Self::EmergencyTranslationFailure => "EMERGENCY_TRANSLATION_FAILURE",
        }
    }
}

impl fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn check_event(event: &AuditEvent) -> Vec<ComplianceViolation> {
    let mut violations = Vec::new();
    let emergency = event.emergency.unwrap_or(false);

    if event.phi_detected.unwrap_or(false) {
        violations.push(ComplianceViolation::PhiDetected);
    }
    if emergency {
        if event
            .processing_time_ms
            .is_some_and(|ms| ms > EMERGENCY_RESPONSE_LIMIT_MS)
        {
            violations.push(ComplianceViolation::EmergencyResponseSlow);
        }
        if event.quality_score.is_some_and(|q| q < EMERGENCY_MIN_QUALITY) {
            violations.push(ComplianceViolation::EmergencyLowQuality);
        }
        if event.result == AuditResult::Failure {
            violations.push(ComplianceViolation::EmergencyTranslationFailure);
        }
    }
    violations
}

/// Emergencies and PHI exposure need a human to look at the event now
pub fn requires_immediate_review(event: &AuditEvent, violations: &[ComplianceViolation]) -> bool {
    !violations.is_empty()
        && (event.emergency.unwrap_or(false) || violations.contains(&ComplianceViolation::PhiDetected))
}
