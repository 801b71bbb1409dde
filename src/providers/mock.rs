/*!
 * Scripted translator for tests.
 *
 * Behaviors:
 * - `MockTranslator::working()` - Always succeeds with a marked translation
 * - `MockTranslator::failing()` - Always fails with a server error
 * - `MockTranslator::intermittent(n)` - Fails every n-th call
 * - `MockTranslator::slow(ms)` - Sleeps before answering, for timeout tests
 * - `MockTranslator::empty()` - Returns an empty translation
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Translator, TranslatorOutput, TranslatorRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    Working,
    Failing,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    Slow { delay_ms: u64 },
    Empty,
}

#[derive(Debug)]
pub struct MockTranslator {
    name: String,
    behavior: MockBehavior,
    confidence: f64,
    /// Shared by clones so intermittent failures span them
    request_count: Arc<AtomicUsize>,
    custom_response: Option<fn(&TranslatorRequest) -> String>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            confidence: 0.95,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&TranslatorRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &TranslatorRequest) -> TranslatorOutput {
        let translated_text = match self.custom_response {
            Some(generator) => generator(request),
            None => format!("[{}] {}", request.target_language, request.text),
        };
        TranslatorOutput {
            translated_text,
            confidence: self.confidence,
        }
    }
}

impl Clone for MockTranslator {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            behavior: self.behavior,
            confidence: self.confidence,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, request: &TranslatorRequest) -> Result<TranslatorOutput, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(request)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated translator failure".to_string(),
            }),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(self.respond(request))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(request))
            }

            MockBehavior::Empty => Ok(TranslatorOutput {
                translated_text: String::new(),
                confidence: self.confidence,
            }),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
