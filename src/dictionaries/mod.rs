/*!
 * Term & pattern library.
 *
 * Static, read-only dictionaries shared by every pipeline stage. A
 * `TermLibrary` is built once at startup, optionally extended with custom
 * PHI patterns from configuration, and handed to each component behind an
 * `Arc` so concurrent requests read it without locking.
 */

pub mod lexicon;
pub mod medical;
pub mod patterns;

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::app_config::CustomPatternConfig;
use lexicon::{QualityLexicon, RoutingLexicon};
use medical::MedicalTerm;
use patterns::SensitivePattern;

/// Immutable dictionaries injected into the analyzers
#[derive(Debug, Clone)]
pub struct TermLibrary {
    pub phi_patterns: Vec<SensitivePattern>,
    pub medical_terms: Vec<MedicalTerm>,
    pub emergency_keywords: Vec<String>,
    pub acute_modifiers: Vec<String>,
    pub chronic_modifiers: Vec<String>,
    pub quality: QualityLexicon,
    pub routing: RoutingLexicon,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl TermLibrary {
    /// The built-in dictionaries only
    pub fn builtin() -> Self {
        Self {
            phi_patterns: patterns::builtin_patterns(),
            medical_terms: medical::builtin_terms(),
            emergency_keywords: owned(medical::EMERGENCY_KEYWORDS),
            acute_modifiers: owned(medical::ACUTE_MODIFIERS),
            chronic_modifiers: owned(medical::CHRONIC_MODIFIERS),
            quality: lexicon::builtin_quality_lexicon(),
            routing: lexicon::builtin_routing_lexicon(),
        }
    }

    /// Built-in dictionaries plus site-specific PHI patterns, appended in order
    pub fn with_custom_patterns(custom: &[CustomPatternConfig]) -> Result<Self> {
        let mut library = Self::builtin();
        for pattern in custom {
            library.phi_patterns.push(SensitivePattern::from_config(pattern)?);
        }
        if !custom.is_empty() {
            info!("Loaded {} custom PHI pattern(s)", custom.len());
        }
        Ok(library)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Whether any emergency keyword occurs in already lower-cased text
    pub fn has_emergency_keyword(&self, lowered: &str) -> bool {
        self.emergency_keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

impl Default for TermLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
