/*!
 * PHI detection and redaction.
 *
 * Every sensitive pattern in the term library is applied, in order, to the
 * original text. Each hit becomes a `SensitiveMatch` and every occurrence of
 * the matched value is replaced by the pattern's token in the redacted text.
 * The result carries a risk level, a manual-review flag and a compliance
 * score computed from the severities seen.
 *
 * Matched values live only inside the returned `RedactionResult`; they are
 * masked in `Debug` output and never serialized.
 */

pub mod report;

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::app_config::RedactionConfig;
use crate::dictionaries::TermLibrary;
use crate::dictionaries::patterns::{PhiCategory, Severity};
use crate::models::MedicalContext;

pub use report::{PhiRiskReport, PreparedText, SafetyAssessment};

/// Notice appended to emergency text when some identifiers were kept
pub const PRIVACY_NOTICE: &str =
    "\n\n[PRIVACY NOTICE: Some identifying information may be preserved for emergency medical care]";

/// Overall exposure of a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// One detected sensitive value
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveMatch {
    pub pattern_name: String,
    #[serde(skip_serializing)]
    pub value: String,
    /// Byte offset in the original text
    pub position: usize,
    pub severity: Severity,
    pub category: PhiCategory,
    pub replacement: String,
}

impl fmt::Debug for SensitiveMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensitiveMatch")
            .field("pattern_name", &self.pattern_name)
            .field("value", &"***")
            .field("position", &self.position)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .finish()
    }
}

/// Outcome of a redaction pass
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionResult {
    #[serde(skip_serializing)]
    pub original_text: String,
    pub redacted_text: String,
    pub matches: Vec<SensitiveMatch>,
    pub risk_level: RiskLevel,
    pub requires_manual_review: bool,
    pub compliance_score: f64,
    pub highest_severity: Option<Severity>,
    /// Replacement token to number of matches it stands for
    pub redaction_map: BTreeMap<String, usize>,
}

impl fmt::Debug for RedactionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionResult")
            .field("redacted_text", &self.redacted_text)
            .field("matches", &self.matches)
            .field("risk_level", &self.risk_level)
            .field("requires_manual_review", &self.requires_manual_review)
            .field("compliance_score", &self.compliance_score)
            .finish()
    }
}

impl RedactionResult {
    /// Result used when analysis could not run: nothing is trusted
    pub fn worst_case(text: &str) -> Self {
        Self {
            original_text: text.to_string(),
            redacted_text: "[CONTENT-WITHHELD]".to_string(),
            matches: Vec::new(),
            risk_level: RiskLevel::Critical,
            requires_manual_review: true,
            compliance_score: 0.0,
            highest_severity: Some(Severity::Critical),
            redaction_map: BTreeMap::new(),
        }
    }

    pub fn has_phi(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn count_at(&self, severity: Severity) -> usize {
        self.matches.iter().filter(|m| m.severity == severity).count()
    }
}

/// Severity tallies used by the classifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_matches(matches: &[SensitiveMatch]) -> Self {
        let mut counts = Self::default();
        for m in matches {
            match m.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

pub fn classify_risk(counts: SeverityCounts) -> RiskLevel {
    if counts.critical > 0 || counts.high >= 2 || (counts.high >= 1 && counts.medium >= 2) {
        RiskLevel::Critical
    } else if counts.high >= 1 || counts.medium >= 3 {
        RiskLevel::High
    } else if counts.medium >= 1 || counts.low >= 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn requires_manual_review(counts: SeverityCounts, context: MedicalContext) -> bool {
    if counts.critical > 0 {
        return true;
    }
    if context.is_emergency() {
        counts.high >= 3
    } else {
        counts.high >= 1 || counts.total() >= 4
    }
}

/// Redaction settings copied out of the configuration
#[derive(Debug, Clone)]
pub struct RedactionSettings {
    pub enable_redaction: bool,
    pub strict_mode: bool,
    pub preserve_emergency_info: bool,
    pub penalty_critical: f64,
    pub penalty_high: f64,
    pub penalty_medium: f64,
    pub penalty_low: f64,
    pub emergency_bonus: f64,
    pub redaction_bonus: f64,
}

impl From<&RedactionConfig> for RedactionSettings {
    fn from(config: &RedactionConfig) -> Self {
        Self {
            enable_redaction: config.enable_redaction,
            strict_mode: config.strict_mode,
            preserve_emergency_info: config.preserve_emergency_info,
            penalty_critical: config.penalty_critical,
            penalty_high: config.penalty_high,
            penalty_medium: config.penalty_medium,
            penalty_low: config.penalty_low,
            emergency_bonus: config.emergency_bonus,
            redaction_bonus: config.redaction_bonus,
        }
    }
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self::from(&RedactionConfig::default())
    }
}

impl RedactionSettings {
    fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.penalty_critical,
            Severity::High => self.penalty_high,
            Severity::Medium => self.penalty_medium,
            Severity::Low => self.penalty_low,
        }
    }

    /// Compliance score for a set of matches. A critical identifier counts as
    /// unmitigated, so it forfeits the redaction bonus.
    pub fn compliance_score(&self, matches: &[SensitiveMatch], context: MedicalContext) -> f64 {
        let mut score = 1.0;
        for m in matches {
            score -= self.penalty(m.severity);
        }
        if context.is_emergency() {
            score += self.emergency_bonus;
        }
        let has_critical = matches.iter().any(|m| m.severity == Severity::Critical);
        if self.enable_redaction && !has_critical {
            score += self.redaction_bonus;
        }
        f64::clamp(score, 0.0, 1.0)
    }
}

/// Finds and masks sensitive data
#[derive(Debug, Clone)]
pub struct PhiDetector {
    library: Arc<TermLibrary>,
    settings: RedactionSettings,
}

impl PhiDetector {
    pub fn new(library: Arc<TermLibrary>, settings: RedactionSettings) -> Self {
        Self { library, settings }
    }

    pub fn settings(&self) -> &RedactionSettings {
        &self.settings
    }

    /// Detect, classify and (when enabled) redact sensitive data in `text`
    pub fn redact(&self, text: &str, context: MedicalContext) -> RedactionResult {
        let emergency = context.is_emergency();
        let mut redacted = text.to_string();
        let mut matches = Vec::new();
        let mut redaction_map: BTreeMap<String, usize> = BTreeMap::new();

        for pattern in &self.library.phi_patterns {
            if emergency && pattern.name_like && self.settings.preserve_emergency_info {
                continue;
            }
            if emergency && pattern.severity == Severity::Low && !self.settings.strict_mode {
                continue;
            }

            for (position, value) in pattern.find_values(text) {
                matches.push(SensitiveMatch {
                    pattern_name: pattern.name.clone(),
                    value: value.to_string(),
                    position,
                    severity: pattern.severity,
                    category: pattern.category,
                    replacement: pattern.replacement.clone(),
                });
                *redaction_map.entry(pattern.replacement.clone()).or_insert(0) += 1;

                if self.settings.enable_redaction {
                    redacted = redacted.replace(value, &pattern.replacement);
                }
            }
        }

        if emergency
            && !matches.is_empty()
            && self.settings.preserve_emergency_info
            && !redacted.ends_with(PRIVACY_NOTICE)
        {
            redacted.push_str(PRIVACY_NOTICE);
        }

        let counts = SeverityCounts::from_matches(&matches);
        let risk_level = classify_risk(counts);
        let requires_manual_review = requires_manual_review(counts, context);
        let compliance_score = self.settings.compliance_score(&matches, context);
        let highest_severity = matches.iter().map(|m| m.severity).max();

        if !matches.is_empty() {
            debug!(
                "PHI scan found {} match(es) in {} context: risk={}, review={}",
                matches.len(),
                context,
                risk_level,
                requires_manual_review
            );
        }

        RedactionResult {
            original_text: text.to_string(),
            redacted_text: redacted,
            matches,
            risk_level,
            requires_manual_review,
            compliance_score,
            highest_severity,
            redaction_map,
        }
    }
}
