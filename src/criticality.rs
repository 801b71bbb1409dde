/*!
 * Medical criticality analysis.
 *
 * Scores how urgent an utterance is from the medical terms it mentions, the
 * onset or chronicity words around them and the presence of emergency
 * keywords, then recommends the medical context the rest of the pipeline
 * should run under.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::app_config::CriticalityConfig;
use crate::dictionaries::TermLibrary;
use crate::dictionaries::medical::{CriticalityTier, TermCategory};
use crate::models::MedicalContext;

/// Upper bound of the criticality score
pub const MAX_SCORE: u32 = 100;

/// Temporal framing of the symptoms described
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierContext {
    Acute,
    Chronic,
    Neutral,
}

impl fmt::Display for ModifierContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Acute => "acute",
            Self::Chronic => "chronic",
            Self::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalityResult {
    pub contains_medical: bool,
    pub is_emergency: bool,
    /// Canonical forms, in dictionary order
    pub detected_terms: Vec<String>,
    pub recommended_context: MedicalContext,
    pub criticality_score: u32,
    pub modifier_context: ModifierContext,
}

#[derive(Debug, Clone)]
pub struct CriticalityAnalyzer {
    library: Arc<TermLibrary>,
    config: CriticalityConfig,
}

impl CriticalityAnalyzer {
    pub fn new(library: Arc<TermLibrary>, config: CriticalityConfig) -> Self {
        Self { library, config }
    }

    fn base_score(&self, tier: CriticalityTier) -> u32 {
        match tier {
            CriticalityTier::Critical => self.config.base_critical,
            CriticalityTier::High => self.config.base_high,
            CriticalityTier::Medium => self.config.base_medium,
            CriticalityTier::Low => self.config.base_low,
        }
    }

    /// Acute wins over chronic when both kinds of words are present
    pub fn modifier_context(&self, lowered: &str) -> ModifierContext {
        let has = |words: &[String]| words.iter().any(|w| lowered.contains(w.as_str()));
        if has(&self.library.acute_modifiers) {
            ModifierContext::Acute
        } else if has(&self.library.chronic_modifiers) {
            ModifierContext::Chronic
        } else {
            ModifierContext::Neutral
        }
    }

    fn adjusted(&self, base: u32, modifier: ModifierContext) -> u32 {
        let factor = match modifier {
            ModifierContext::Acute => self.config.acute_multiplier,
            ModifierContext::Chronic => self.config.chronic_multiplier,
            ModifierContext::Neutral => return base,
        };
        (base as f64 * factor).floor() as u32
    }

    pub fn analyze(&self, text: &str) -> CriticalityResult {
        let lowered = text.to_lowercase();
        let modifier_context = self.modifier_context(&lowered);

        let detected: Vec<_> = self
            .library
            .medical_terms
            .iter()
            .filter(|term| term.matches(&lowered))
            .collect();

        let mut score: u32 = detected
            .iter()
            .map(|term| self.adjusted(self.base_score(term.criticality), modifier_context))
            .sum();

        let emergency_keyword = self.library.has_emergency_keyword(&lowered);
        let is_emergency = emergency_keyword && modifier_context != ModifierContext::Chronic;
        if is_emergency {
            score += self.config.emergency_keyword_bonus;
        }
        let criticality_score = score.min(MAX_SCORE);

        let recommended_context = if is_emergency {
            MedicalContext::Emergency
        } else if detected.iter().any(|t| t.category == TermCategory::Medication) {
            MedicalContext::Medication
        } else if !detected.is_empty() {
            MedicalContext::Consultation
        } else {
            MedicalContext::General
        };

        debug!(
            "Criticality: {} term(s), modifier={}, score={}, emergency={}",
            detected.len(),
            modifier_context,
            criticality_score,
            is_emergency
        );

        CriticalityResult {
            contains_medical: !detected.is_empty(),
            is_emergency,
            detected_terms: detected.iter().map(|t| t.term.clone()).collect(),
            recommended_context,
            criticality_score,
            modifier_context,
        }
    }
}
