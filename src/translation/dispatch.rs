/*!
 * Translator dispatch.
 *
 * Runs the engine picked by the routing policy under the caller's timeout.
 * A failed or late engine gets one retry on the alternate strategy; if that
 * fails too the original text comes back with zero confidence and a reason.
 * Engine failures never reach the caller.
 *
 * Dispatch only reads the cache. Callers hand an outcome back through
 * `remember` once it has been cleared for delivery.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Translator, TranslatorOutput, TranslatorRequest};
use crate::routing::{RouteDecision, Strategy};
use crate::translation::cache::{CachedTranslation, TranslationCache};

pub const METHOD_PASSTHROUGH: &str = "passthrough";
pub const METHOD_FALLBACK: &str = "fallback";

/// What the dispatcher produced for one request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub translated_text: String,
    pub confidence: f64,
    /// Engine name, `passthrough` or `fallback`
    pub method: String,
    /// Strategy that produced the text, if an engine did
    pub strategy: Option<Strategy>,
    pub fallback_reason: Option<String>,
    pub from_cache: bool,
}

impl DispatchOutcome {
    fn passthrough(text: &str) -> Self {
        Self {
            translated_text: text.to_string(),
            confidence: 1.0,
            method: METHOD_PASSTHROUGH.to_string(),
            strategy: None,
            fallback_reason: None,
            from_cache: false,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    fast: Arc<dyn Translator>,
    reasoning: Arc<dyn Translator>,
    cache: TranslationCache,
}

impl Dispatcher {
    pub fn new(fast: Arc<dyn Translator>, reasoning: Arc<dyn Translator>, cache: TranslationCache) -> Self {
        Self { fast, reasoning, cache }
    }

    pub fn engine(&self, strategy: Strategy) -> &Arc<dyn Translator> {
        match strategy {
            Strategy::Fast => &self.fast,
            Strategy::Reasoning => &self.reasoning,
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        request: &TranslatorRequest,
        timeout: Duration,
    ) -> Result<TranslatorOutput, ProviderError> {
        let engine = self.engine(strategy);
        let output = tokio::time::timeout(timeout, engine.translate(request))
            .await
            .map_err(|_| ProviderError::Timeout(timeout.as_millis() as u64))??;
        if output.translated_text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(engine.name().to_string()));
        }
        Ok(output)
    }

    pub async fn dispatch(
        &self,
        request: &TranslatorRequest,
        route: &RouteDecision,
        timeout: Duration,
    ) -> DispatchOutcome {
        let strategy = match route {
            RouteDecision::Passthrough => return DispatchOutcome::passthrough(&request.text),
            RouteDecision::Translate { strategy, .. } => *strategy,
        };

        if let Some(hit) = self
            .cache
            .get(&request.text, &request.source_language, &request.target_language)
        {
            return DispatchOutcome {
                translated_text: hit.output.translated_text,
                confidence: hit.output.confidence,
                method: hit.method,
                strategy: Some(strategy),
                fallback_reason: None,
                from_cache: true,
            };
        }

        let mut failures = Vec::with_capacity(2);
        for current in [strategy, strategy.alternate()] {
            match self.attempt(current, request, timeout).await {
                Ok(output) => {
                    let method = self.engine(current).name().to_string();
                    if current != strategy {
                        debug!("Alternate {} engine succeeded after {} failed", current, strategy);
                    }
                    return DispatchOutcome {
                        translated_text: output.translated_text,
                        confidence: output.confidence,
                        method,
                        strategy: Some(current),
                        fallback_reason: None,
                        from_cache: false,
                    };
                }
                Err(e) => {
                    warn!("{} engine failed: {}", current, e);
                    failures.push(format!("{} engine: {}", current, e));
                }
            }
        }

        DispatchOutcome {
            translated_text: request.text.clone(),
            confidence: 0.0,
            method: METHOD_FALLBACK.to_string(),
            strategy: None,
            fallback_reason: Some(format!("All translation engines failed ({})", failures.join("; "))),
            from_cache: false,
        }
    }

    /// Cache a delivered engine translation; passthroughs, fallbacks and hits are skipped
    pub fn remember(&self, request: &TranslatorRequest, outcome: &DispatchOutcome) {
        if outcome.is_fallback() || outcome.from_cache || outcome.strategy.is_none() {
            return;
        }
        self.cache.store(
            &request.text,
            &request.source_language,
            &request.target_language,
            CachedTranslation {
                output: TranslatorOutput {
                    translated_text: outcome.translated_text.clone(),
                    confidence: outcome.confidence,
                },
                method: outcome.method.clone(),
            },
        );
    }
}
