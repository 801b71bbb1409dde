use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

use crate::dictionaries::patterns::{PhiCategory, Severity};
use crate::models::PerformanceMode;

/// Application configuration module
/// This module handles the gateway configuration including loading,
/// validating and saving configuration settings. Every scoring constant
/// lives here as a named, tunable parameter.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default source language code (ISO) for the CLI
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Default target language code (ISO) for the CLI
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Request handling
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// PHI redaction
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Criticality scoring
    #[serde(default)]
    pub criticality: CriticalityConfig,

    /// Quality scoring and review thresholds
    #[serde(default)]
    pub quality: QualityConfig,

    /// Strategy selection
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Translator backends
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Translation cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Reviewer alerts
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// SQLite database file; defaults to the user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Request handling settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Maximum characters accepted per request
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Per-call translator timeout in milliseconds
    #[serde(default = "default_translator_timeout_ms")]
    pub translator_timeout_ms: u64,

    /// Include the unreviewed candidate in pending-review responses
    #[serde(default)]
    pub share_unreviewed_candidate: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            translator_timeout_ms: default_translator_timeout_ms(),
            share_unreviewed_candidate: false,
        }
    }
}

/// A site-specific sensitive pattern added on top of the built-in set
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomPatternConfig {
    pub name: String,
    /// Regular expression
    pub pattern: String,
    /// Token that replaces the matched value
    pub replacement: String,
    pub severity: Severity,
    pub category: PhiCategory,
    /// Capture group holding the sensitive value (whole match if absent)
    #[serde(default)]
    pub value_group: Option<usize>,
}

/// PHI redaction settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedactionConfig {
    /// Replace detected values with tokens
    #[serde(default = "default_true")]
    pub enable_redaction: bool,

    /// Apply low-severity patterns even in emergency context
    #[serde(default)]
    pub strict_mode: bool,

    /// Keep names visible in emergency context
    #[serde(default = "default_true")]
    pub preserve_emergency_info: bool,

    /// Record an audit event for every request with detections
    #[serde(default = "default_true")]
    pub audit_redactions: bool,

    /// Penalty per match, by severity
    #[serde(default = "default_penalty_critical")]
    pub penalty_critical: f64,
    #[serde(default = "default_penalty_high")]
    pub penalty_high: f64,
    #[serde(default = "default_penalty_medium")]
    pub penalty_medium: f64,
    #[serde(default = "default_penalty_low")]
    pub penalty_low: f64,

    /// Compliance bonus for emergency context
    #[serde(default = "default_emergency_bonus")]
    pub emergency_bonus: f64,

    /// Compliance bonus when redaction is enabled and nothing critical was found
    #[serde(default = "default_redaction_bonus")]
    pub redaction_bonus: f64,

    /// Additional patterns appended after the built-in set
    #[serde(default)]
    pub custom_patterns: Vec<CustomPatternConfig>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enable_redaction: true,
            strict_mode: false,
            preserve_emergency_info: true,
            audit_redactions: true,
            penalty_critical: default_penalty_critical(),
            penalty_high: default_penalty_high(),
            penalty_medium: default_penalty_medium(),
            penalty_low: default_penalty_low(),
            emergency_bonus: default_emergency_bonus(),
            redaction_bonus: default_redaction_bonus(),
            custom_patterns: Vec::new(),
        }
    }
}

/// Criticality scoring parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CriticalityConfig {
    #[serde(default = "default_base_critical")]
    pub base_critical: u32,
    #[serde(default = "default_base_high")]
    pub base_high: u32,
    #[serde(default = "default_base_medium")]
    pub base_medium: u32,
    #[serde(default = "default_base_low")]
    pub base_low: u32,

    /// Multiplier applied to each base under chronic context
    #[serde(default = "default_chronic_multiplier")]
    pub chronic_multiplier: f64,

    /// Multiplier applied to each base under acute context
    #[serde(default = "default_acute_multiplier")]
    pub acute_multiplier: f64,

    /// Flat bonus when an emergency keyword is present outside chronic context
    #[serde(default = "default_emergency_keyword_bonus")]
    pub emergency_keyword_bonus: u32,
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            base_critical: default_base_critical(),
            base_high: default_base_high(),
            base_medium: default_base_medium(),
            base_low: default_base_low(),
            chronic_multiplier: default_chronic_multiplier(),
            acute_multiplier: default_acute_multiplier(),
            emergency_keyword_bonus: default_emergency_keyword_bonus(),
        }
    }
}

/// Quality composite weights and review thresholds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QualityConfig {
    #[serde(default = "default_weight_confidence")]
    pub weight_confidence: f64,
    #[serde(default = "default_weight_medical_accuracy")]
    pub weight_medical_accuracy: f64,
    #[serde(default = "default_weight_cultural")]
    pub weight_cultural: f64,
    #[serde(default = "default_weight_terminology")]
    pub weight_terminology: f64,
    /// Subtracted, scaled by the bias score
    #[serde(default = "default_weight_bias")]
    pub weight_bias: f64,
    /// Subtracted, scaled by the hallucination risk
    #[serde(default = "default_weight_hallucination")]
    pub weight_hallucination: f64,

    /// Emergency translations below this score are reviewed
    #[serde(default = "default_emergency_review_below")]
    pub emergency_review_below: f64,

    /// Other translations below this score are reviewed
    #[serde(default = "default_review_below")]
    pub review_below: f64,

    /// Medical accuracy below this triggers review
    #[serde(default = "default_medical_accuracy_review_below")]
    pub medical_accuracy_review_below: f64,

    /// Emergency reviews below this score become critical
    #[serde(default = "default_critical_priority_below")]
    pub critical_priority_below: f64,

    /// Non-emergency reviews below this score become medium priority
    #[serde(default = "default_medium_priority_below")]
    pub medium_priority_below: f64,

    /// Fact-check confidence below this is an issue in emergency context
    #[serde(default = "default_emergency_min_confidence")]
    pub emergency_min_confidence: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weight_confidence: default_weight_confidence(),
            weight_medical_accuracy: default_weight_medical_accuracy(),
            weight_cultural: default_weight_cultural(),
            weight_terminology: default_weight_terminology(),
            weight_bias: default_weight_bias(),
            weight_hallucination: default_weight_hallucination(),
            emergency_review_below: default_emergency_review_below(),
            review_below: default_review_below(),
            medical_accuracy_review_below: default_medical_accuracy_review_below(),
            critical_priority_below: default_critical_priority_below(),
            medium_priority_below: default_medium_priority_below(),
            emergency_min_confidence: default_emergency_min_confidence(),
        }
    }
}

/// Strategy selection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoutingConfig {
    /// Length above which medical text goes to the reasoning engine
    #[serde(default = "default_long_text_chars")]
    pub long_text_chars: usize,

    /// Length above which standard mode still allows reasoning
    #[serde(default = "default_very_long_text_chars")]
    pub very_long_text_chars: usize,

    /// Mode applied when a request does not specify one
    #[serde(default)]
    pub default_mode: Option<PerformanceMode>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            long_text_chars: default_long_text_chars(),
            very_long_text_chars: default_very_long_text_chars(),
            default_mode: None,
        }
    }
}

/// Ollama backend settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProvidersConfig {
    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model used by the fast, literal strategy
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model used by the reasoning strategy
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,

    /// Temperature for the reasoning strategy (fast always uses 0)
    #[serde(default = "default_temperature")]
    pub reasoning_temperature: f32,

    /// Retry count for transient HTTP failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Answer fixed emergency phrases without calling the model
    #[serde(default = "default_true")]
    pub use_emergency_phrasebook: bool,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            fast_model: default_fast_model(),
            reasoning_model: default_reasoning_model(),
            reasoning_temperature: default_temperature(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            use_emergency_phrasebook: true,
        }
    }
}

/// Translation cache settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Reviewer alert settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Webhook receiving alert JSON; alerts are only logged when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Delivery timeout in milliseconds
    #[serde(default = "default_notification_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: default_notification_timeout_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_max_text_chars() -> usize {
    5000
}

fn default_translator_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_penalty_critical() -> f64 {
    0.4
}

fn default_penalty_high() -> f64 {
    0.2
}

fn default_penalty_medium() -> f64 {
    0.1
}

fn default_penalty_low() -> f64 {
    0.05
}

fn default_emergency_bonus() -> f64 {
    0.2
}

fn default_redaction_bonus() -> f64 {
    0.1
}

fn default_base_critical() -> u32 {
    25
}

fn default_base_high() -> u32 {
    15
}

fn default_base_medium() -> u32 {
    10
}

fn default_base_low() -> u32 {
    5
}

fn default_chronic_multiplier() -> f64 {
    0.4
}

fn default_acute_multiplier() -> f64 {
    1.2
}

fn default_emergency_keyword_bonus() -> u32 {
    20
}

fn default_weight_confidence() -> f64 {
    0.20
}

fn default_weight_medical_accuracy() -> f64 {
    0.30
}

fn default_weight_cultural() -> f64 {
    0.15
}

fn default_weight_terminology() -> f64 {
    0.20
}

fn default_weight_bias() -> f64 {
    0.10
}

fn default_weight_hallucination() -> f64 {
    0.05
}

fn default_emergency_review_below() -> f64 {
    0.9
}

fn default_review_below() -> f64 {
    0.7
}

fn default_medical_accuracy_review_below() -> f64 {
    0.8
}

fn default_critical_priority_below() -> f64 {
    0.7
}

fn default_medium_priority_below() -> f64 {
    0.7
}

fn default_emergency_min_confidence() -> f64 {
    0.8
}

fn default_long_text_chars() -> usize {
    100
}

fn default_very_long_text_chars() -> usize {
    500
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_fast_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_reasoning_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_notification_timeout_ms() -> u64 {
    2_000
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{} must be between 0 and 1 (got {})", name, value));
    }
    Ok(())
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if self.gateway.max_text_chars == 0 {
            return Err(anyhow!("gateway.max_text_chars must be greater than zero"));
        }
        if self.gateway.translator_timeout_ms == 0 {
            return Err(anyhow!("gateway.translator_timeout_ms must be greater than zero"));
        }

        let r = &self.redaction;
        for (name, value) in [
            ("redaction.penalty_critical", r.penalty_critical),
            ("redaction.penalty_high", r.penalty_high),
            ("redaction.penalty_medium", r.penalty_medium),
            ("redaction.penalty_low", r.penalty_low),
            ("redaction.emergency_bonus", r.emergency_bonus),
            ("redaction.redaction_bonus", r.redaction_bonus),
        ] {
            check_unit_interval(name, value)?;
        }
        for custom in &r.custom_patterns {
            regex::Regex::new(&custom.pattern)
                .map_err(|e| anyhow!("Invalid custom pattern '{}': {}", custom.name, e))?;
        }

        let c = &self.criticality;
        if c.chronic_multiplier < 0.0 || c.acute_multiplier < 0.0 {
            return Err(anyhow!("criticality multipliers must not be negative"));
        }

        let q = &self.quality;
        for (name, value) in [
            ("quality.weight_confidence", q.weight_confidence),
            ("quality.weight_medical_accuracy", q.weight_medical_accuracy),
            ("quality.weight_cultural", q.weight_cultural),
            ("quality.weight_terminology", q.weight_terminology),
            ("quality.weight_bias", q.weight_bias),
            ("quality.weight_hallucination", q.weight_hallucination),
            ("quality.emergency_review_below", q.emergency_review_below),
            ("quality.review_below", q.review_below),
            ("quality.medical_accuracy_review_below", q.medical_accuracy_review_below),
            ("quality.critical_priority_below", q.critical_priority_below),
            ("quality.medium_priority_below", q.medium_priority_below),
            ("quality.emergency_min_confidence", q.emergency_min_confidence),
        ] {
            check_unit_interval(name, value)?;
        }

        if self.routing.very_long_text_chars < self.routing.long_text_chars {
            return Err(anyhow!(
                "routing.very_long_text_chars must not be below routing.long_text_chars"
            ));
        }

        url::Url::parse(&self.providers.endpoint)
            .map_err(|e| anyhow!("Invalid provider endpoint '{}': {}", self.providers.endpoint, e))?;
        if self.providers.fast_model.is_empty() || self.providers.reasoning_model.is_empty() {
            return Err(anyhow!("Both fast_model and reasoning_model must be set"));
        }

        if let Some(webhook) = &self.notifications.webhook_url {
            url::Url::parse(webhook)
                .map_err(|e| anyhow!("Invalid notification webhook '{}': {}", webhook, e))?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            gateway: GatewayConfig::default(),
            redaction: RedactionConfig::default(),
            criticality: CriticalityConfig::default(),
            quality: QualityConfig::default(),
            routing: RoutingConfig::default(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            notifications: NotificationConfig::default(),
            database_path: None,
            log_level: LogLevel::default(),
        }
    }
}
