/*!
 * Translation strategy selection.
 *
 * Chooses between the fast, deterministic engine and the reasoning-capable
 * engine before any translator is called. Requests whose source and target
 * languages are the same never reach an engine.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::app_config::RoutingConfig;
use crate::dictionaries::TermLibrary;
use crate::language_utils::language_codes_match;
use crate::models::{MedicalContext, PerformanceMode};

/// Translation engine class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Low latency, temperature 0
    Fast,
    /// Slower engine for nuanced medical content
    Reasoning,
}

impl Strategy {
    /// The other engine, used for the single retry
    pub fn alternate(self) -> Self {
        match self {
            Self::Fast => Self::Reasoning,
            Self::Reasoning => Self::Fast,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Reasoning => "reasoning",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Source and target are the same language
    Passthrough,
    Translate { strategy: Strategy, reason: String },
}

impl RouteDecision {
    fn translate(strategy: Strategy, reason: impl Into<String>) -> Self {
        Self::Translate {
            strategy,
            reason: reason.into(),
        }
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::Passthrough => None,
            Self::Translate { strategy, .. } => Some(*strategy),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    library: Arc<TermLibrary>,
    config: RoutingConfig,
}

impl RoutingPolicy {
    pub fn new(library: Arc<TermLibrary>, config: RoutingConfig) -> Self {
        Self { library, config }
    }

    pub fn select(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: MedicalContext,
        mode: Option<PerformanceMode>,
    ) -> RouteDecision {
        if language_codes_match(source_language, target_language) {
            return RouteDecision::Passthrough;
        }

        let decision = self.route_by_content(text, context, mode.or(self.config.default_mode));
        if let RouteDecision::Translate { strategy, reason } = &decision {
            debug!("Routing to {} engine: {}", strategy, reason);
        }
        decision
    }

    fn route_by_content(
        &self,
        text: &str,
        context: MedicalContext,
        mode: Option<PerformanceMode>,
    ) -> RouteDecision {
        if context.is_emergency() {
            return RouteDecision::translate(Strategy::Fast, "emergency context");
        }

        let lowered = text.to_lowercase();
        if mode == Some(PerformanceMode::Optimized) && self.library.has_emergency_keyword(&lowered) {
            return RouteDecision::translate(Strategy::Fast, "optimized mode with emergency keyword");
        }

        let length = text.chars().count();
        let preferred = if let Some(name) = self.library.routing.complex_match(text) {
            RouteDecision::translate(Strategy::Reasoning, format!("complex medical content ({})", name))
        } else if context == MedicalContext::Medication {
            RouteDecision::translate(Strategy::Reasoning, "medication context")
        } else if length > self.config.long_text_chars
            && self.library.routing.medical_keywords.is_match(text)
        {
            RouteDecision::translate(Strategy::Reasoning, "long medical text")
        } else {
            RouteDecision::translate(Strategy::Fast, "simple content")
        };

        if mode == Some(PerformanceMode::Standard)
            && preferred.strategy() == Some(Strategy::Reasoning)
            && context != MedicalContext::Medication
            && length <= self.config.very_long_text_chars
        {
            return RouteDecision::translate(Strategy::Fast, "standard mode limits reasoning use");
        }
        preferred
    }
}
