/*!
 * Translation engines.
 *
 * Every engine implements the `Translator` trait so the dispatcher can swap
 * them per routing strategy:
 * - Ollama: local LLM server, one model per strategy
 * - Phrasebook: fixed emergency phrases in front of another engine
 * - Mock: scripted behaviors for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::models::MedicalContext;

/// Confidence reported for a model translation
pub const MODEL_CONFIDENCE: f64 = 0.9;

/// One translation call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslatorRequest {
    /// Already-redacted source text
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub context: MedicalContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorOutput {
    pub translated_text: String,
    pub confidence: f64,
}

/// Common interface for translation engines
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate the request text
    ///
    /// # Returns
    /// * `Result<TranslatorOutput, ProviderError>` - The translation and its confidence, or an error
    async fn translate(&self, request: &TranslatorRequest) -> Result<TranslatorOutput, ProviderError>;

    /// Name used in logs and in the response `method` field
    fn name(&self) -> &str;

    /// Check that the engine is reachable
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub mod mock;
pub mod ollama;
pub mod phrasebook;
