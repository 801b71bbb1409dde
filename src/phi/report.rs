/*!
 * Caller-facing views over a redaction pass: text prepared for translation,
 * a storage safety verdict and an aggregate risk report.
 */

use serde::Serialize;
use std::collections::BTreeMap;

use super::{PhiDetector, RedactionResult, RiskLevel, SeverityCounts};
use crate::dictionaries::patterns::{PhiCategory, Severity};
use crate::models::MedicalContext;

/// Text that is safe to hand to a translator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedText {
    pub safe_text: String,
    pub had_phi: bool,
    pub redaction_map: BTreeMap<String, usize>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAssessment {
    pub is_safe: bool,
    pub risk_level: RiskLevel,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhiRiskReport {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
    pub risk_level: RiskLevel,
    pub assessment: String,
    pub recommendations: Vec<String>,
}

fn names_at(result: &RedactionResult, severity: Severity) -> Vec<&str> {
    let mut names: Vec<&str> = result
        .matches
        .iter()
        .filter(|m| m.severity == severity)
        .map(|m| m.pattern_name.as_str())
        .collect();
    names.dedup();
    names
}

impl PhiDetector {
    /// Redact `text` and describe what happened for the caller
    pub fn prepare_for_translation(&self, text: &str, context: MedicalContext) -> PreparedText {
        let result = self.redact(text, context);
        let had_phi = result.has_phi();
        let warning = match (had_phi, context.is_emergency()) {
            (false, _) => None,
            (true, true) => Some(
                "Protected health information detected. Emergency-critical information preserved."
                    .to_string(),
            ),
            (true, false) => Some(
                "Protected health information has been redacted for privacy compliance.".to_string(),
            ),
        };

        PreparedText {
            safe_text: result.redacted_text,
            had_phi,
            redaction_map: result.redaction_map,
            warning,
        }
    }

    /// Whether `text` may be stored or transmitted as-is
    pub fn validate_safety(&self, text: &str, context: MedicalContext) -> SafetyAssessment {
        let result = self.redact(text, context);
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if result.has_phi() {
            let critical = names_at(&result, Severity::Critical);
            if !critical.is_empty() {
                issues.push(format!("Critical PHI detected: {}", critical.join(", ")));
                recommendations.push("Redact critical PHI before any processing".to_string());
            }
            let high = names_at(&result, Severity::High);
            if !high.is_empty() {
                issues.push(format!("High-risk PHI detected: {}", high.join(", ")));
                recommendations.push("Redact high-risk PHI for stronger privacy protection".to_string());
            }
            if !context.is_emergency() {
                recommendations
                    .push("Apply automatic redaction before translation outside emergencies".to_string());
            }
        }

        let is_safe = result.risk_level == RiskLevel::Low
            || (context.is_emergency() && result.risk_level == RiskLevel::Medium);

        SafetyAssessment {
            is_safe,
            risk_level: result.risk_level,
            issues,
            recommendations,
        }
    }

    /// Aggregate counts plus a narrative for privacy reporting
    pub fn risk_report(&self, text: &str, context: MedicalContext) -> PhiRiskReport {
        let result = self.redact(text, context);
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for m in &result.matches {
            *by_category.entry(m.category.to_string()).or_insert(0) += 1;
            *by_severity.entry(m.severity.to_string()).or_insert(0) += 1;
        }

        let counts = SeverityCounts::from_matches(&result.matches);
        let assessment = if counts.total() == 0 {
            "No PHI detected. Text is safe for processing and storage.".to_string()
        } else if counts.critical > 0 {
            format!(
                "Critical privacy risk: {} critical PHI item(s) detected. Redaction required before any processing.",
                counts.critical
            )
        } else if counts.high >= 2 {
            "High privacy risk: several high-severity PHI items detected. Redaction strongly recommended."
                .to_string()
        } else if counts.high == 1 {
            "Moderate privacy risk: high-severity PHI detected. Redact according to use case.".to_string()
        } else {
            "Low privacy risk: minor PHI detected. Standard precautions are sufficient.".to_string()
        };

        PhiRiskReport {
            total: counts.total(),
            by_category,
            by_severity,
            risk_level: result.risk_level,
            assessment,
            recommendations: compliance_recommendations(&result),
        }
    }
}

fn compliance_recommendations(result: &RedactionResult) -> Vec<String> {
    if !result.has_phi() {
        return vec!["Text is compliant for processing and storage".to_string()];
    }

    let mut out = Vec::new();
    if result.count_at(Severity::Critical) > 0 {
        out.push("Redact all critical PHI before processing or storage".to_string());
        out.push("Restrict access to this record".to_string());
        out.push("Collect only the information the encounter needs".to_string());
    }
    if result.matches.iter().any(|m| m.category == PhiCategory::Identifier) {
        out.push("Pseudonymize identifiers where possible".to_string());
    }
    if result.matches.iter().any(|m| m.category == PhiCategory::Medical) {
        out.push("Handle medical identifiers under HIPAA rules".to_string());
    }
    if result.requires_manual_review {
        out.push("Manual privacy review required before processing".to_string());
    }
    out.push("Audit every access to this PHI".to_string());
    out.push("Encrypt the text in transit".to_string());
    out.push("Delete the PHI securely once it is no longer needed".to_string());
    out
}
