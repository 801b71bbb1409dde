use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::ProvidersConfig;
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::models::MedicalContext;
use crate::providers::{Translator, TranslatorOutput, TranslatorRequest, MODEL_CONFIDENCE};
use crate::routing::Strategy;

/// HTTP client for the Ollama generate API
#[derive(Debug)]
pub struct OllamaClient {
    /// Base URL of the Ollama API
    base_url: String,
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    /// Generated text
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
            keep_alive: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Fixed seed so repeated calls give the same output
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).seed = Some(seed);
        self
    }

    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

/// Parse a generate response body; streamed (JSONL) bodies are concatenated
fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(parsed) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(parsed);
    }

    let mut model = String::new();
    let mut response = String::new();
    let mut done = false;
    let mut eval_count = None;
    let mut parsed_any = false;
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => continue,
        };
        parsed_any = true;
        if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
            response.push_str(part);
        }
        if let Some(m) = value.get("model").and_then(|v| v.as_str()) {
            model = m.to_string();
        }
        if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
            done = true;
            eval_count = value.get("eval_count").and_then(|v| v.as_u64());
        }
    }

    if !parsed_any {
        let preview: String = body.chars().take(200).collect();
        return Err(ProviderError::ParseError(format!("invalid JSON from Ollama: {}", preview)));
    }

    Ok(GenerationResponse {
        model,
        created_at: String::new(),
        response,
        done,
        eval_count,
    })
}

impl OllamaClient {
    /// Create a client for a complete base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, max_retries: u32, backoff_base_ms: u64, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                // Ollama serves HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    pub fn from_config(config: &ProvidersConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.retry_count,
            config.retry_backoff_ms,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Generate text with retries on network and server errors
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .text()
                            .await
                            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
                        return parse_generation_body(&body);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let api_error = ProviderError::ApiError {
                        status_code: status.as_u16(),
                        message,
                    };
                    if !status.is_server_error() {
                        // Client errors are not retried
                        error!("Ollama API error: {}", api_error);
                        return Err(api_error);
                    }
                    error!(
                        "Ollama API error: {} - attempt {}/{}",
                        api_error,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(api_error);
                }
                Err(e) => {
                    error!(
                        "Ollama API network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Ollama request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    /// Get the Ollama server version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        response["version"]
            .as_str()
            .map(|v| v.to_string())
            .ok_or_else(|| ProviderError::ParseError("missing version field".to_string()))
    }
}

fn context_instructions(context: MedicalContext) -> &'static str {
    match context {
        MedicalContext::Emergency => {
            "This is an EMERGENCY medical message. Translate literally and keep every urgency marker."
        }
        MedicalContext::Medication => {
            "This message concerns medication. Keep drug names, doses, units and schedules exact."
        }
        MedicalContext::Consultation => {
            "This is part of a clinical consultation. Keep symptoms and medical terms precise."
        }
        MedicalContext::General => "This is a message in a healthcare setting.",
    }
}

fn strategy_instructions(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Fast => "Translate word for word where possible. Do not rephrase or add anything.",
        Strategy::Reasoning => {
            "Consider dosing, interactions and cultural or religious context, then give the most \
             faithful translation. Keep placeholder tokens in square brackets unchanged."
        }
    }
}

/// Build the generate prompt for one translation
pub fn build_prompt(request: &TranslatorRequest, strategy: Strategy) -> String {
    let source = get_language_name(&request.source_language).unwrap_or_else(|_| request.source_language.clone());
    let target = get_language_name(&request.target_language).unwrap_or_else(|_| request.target_language.clone());
    format!(
        "{}\n{}\n\nTranslate the following medical text from {} to {}.\n\
         Reply with ONLY the translation. Keep medical terminology exact and preserve urgency. \
         Keep tokens such as [NAME-REDACTED] unchanged.\n\nSource text: \"{}\"\n\nTranslation:",
        context_instructions(request.context),
        strategy_instructions(strategy),
        source,
        target,
        request.text
    )
}

/// Remove quoting and a leading "Translation:" label from model output
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();
    if text.get(..12).is_some_and(|prefix| prefix.eq_ignore_ascii_case("translation:")) {
        text = text[12..].trim();
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text = &text[1..text.len() - 1];
    }
    text.trim().to_string()
}

/// One Ollama model used as one routing strategy
#[derive(Debug, Clone)]
pub struct OllamaTranslator {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
    strategy: Strategy,
    name: String,
}

impl OllamaTranslator {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>, temperature: f32, strategy: Strategy) -> Self {
        let model = model.into();
        let name = format!("ollama-{}:{}", strategy, model);
        Self {
            client,
            model,
            temperature,
            strategy,
            name,
        }
    }

    /// Deterministic engine: temperature 0 and a literal-fidelity prompt
    pub fn fast(client: Arc<OllamaClient>, config: &ProvidersConfig) -> Self {
        Self::new(client, config.fast_model.clone(), 0.0, Strategy::Fast)
    }

    pub fn reasoning(client: Arc<OllamaClient>, config: &ProvidersConfig) -> Self {
        Self::new(
            client,
            config.reasoning_model.clone(),
            config.reasoning_temperature,
            Strategy::Reasoning,
        )
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(&self, request: &TranslatorRequest) -> Result<TranslatorOutput, ProviderError> {
        let mut generation = GenerationRequest::new(&self.model, build_prompt(request, self.strategy))
            .system("You are a certified medical interpreter.")
            .temperature(self.temperature)
            .keep_alive("10m");
        if self.strategy == Strategy::Fast {
            generation = generation.seed(0);
        }

        let response = self.client.generate(&generation).await?;
        let translated_text = clean_response(&response.response);
        if translated_text.is_empty() {
            return Err(ProviderError::EmptyResponse(self.name.clone()));
        }
        debug!("{} produced {} chars", self.name, translated_text.chars().count());

        Ok(TranslatorOutput {
            translated_text,
            confidence: MODEL_CONFIDENCE,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.client.version().await.map(|_| ())
    }
}
