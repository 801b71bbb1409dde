/*!
 * # LifeBridge - Medical Translation Safety Gateway
 *
 * A Rust library that sits between a clinician or patient and a
 * machine-translation engine, making sure nothing unsafe leaves the
 * building and nothing doubtful reaches a patient unchecked.
 *
 * ## Features
 *
 * - Detect and redact protected health information before translation
 * - Score the medical criticality of an utterance (0-100)
 * - Route each request to a fast or reasoning translation engine
 * - Assess translation quality, bias and hallucination risk
 * - Hold doubtful translations for human review with priorities and escalation
 * - Keep a write-once audit trail with compliance checks
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `dictionaries`: Medical terms, sensitive-data patterns and quality lexicons
 * - `phi`: Sensitive data detection and redaction
 * - `criticality`: Medical criticality scoring
 * - `routing`: Translation strategy selection
 * - `providers`: Translation engines:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::phrasebook`: Fixed emergency phrases
 *   - `providers::mock`: Scripted engine for tests
 * - `translation`: Dispatch with timeout, retry, caching and fallback
 * - `quality`: Translation quality assessment
 * - `decision`: Deliver, redact-and-deliver or hold
 * - `review`: Human review workflow
 * - `audit`: Audit trail and compliance checks
 * - `notification`: Reviewer alert channels
 * - `database`: SQLite persistence for reviews and audit events
 * - `gateway`: The end-to-end request pipeline
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod audit;
pub mod clock;
pub mod criticality;
pub mod database;
pub mod decision;
pub mod dictionaries;
pub mod errors;
pub mod gateway;
pub mod language_utils;
pub mod models;
pub mod notification;
pub mod phi;
pub mod providers;
pub mod quality;
pub mod review;
pub mod routing;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, AuditError, GatewayError, ProviderError, ReviewError, ValidationError};
pub use gateway::{GatewayRequest, GatewayResponse, TranslationGateway};
pub use models::{MedicalContext, PerformanceMode, Priority};
pub use phi::{PhiDetector, RedactionResult, RiskLevel};
pub use review::{ReviewDecision, ReviewRequest, ReviewStatus, ReviewWorkflow};
