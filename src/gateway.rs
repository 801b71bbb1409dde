/*!
 * Translation safety gateway.
 *
 * Runs one utterance through the whole pipeline:
 *
 * 1. Validate the request (text length, language codes)
 * 2. Score medical criticality and resolve the processing context
 * 3. Detect and redact sensitive data; only redacted text goes further
 * 4. Route to a translation strategy and dispatch (timeout, retry, fallback)
 * 5. Assess the candidate translation
 * 6. Deliver it, or hold it and open a single review request
 *
 * Every request ends in exactly one delivered translation or one review
 * request. Audit events are recorded along the way without waiting on the
 * sink.
 */

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, GatewayConfig};
use crate::audit::{AuditEventType, AuditRecorder, AuditResult};
use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::criticality::{CriticalityAnalyzer, CriticalityResult};
use crate::database::Repository;
use crate::decision::{Outcome, decide};
use crate::dictionaries::TermLibrary;
use crate::errors::{GatewayError, ValidationError};
use crate::language_utils::validate_request_language;
use crate::models::{MedicalContext, PerformanceMode, Priority};
use crate::notification;
use crate::phi::{PhiDetector, RedactionResult, RedactionSettings, RiskLevel};
use crate::providers::ollama::{OllamaClient, OllamaTranslator};
use crate::providers::phrasebook::PhrasebookTranslator;
use crate::providers::{Translator, TranslatorRequest};
use crate::quality::{QualityAssessment, QualityAssessor};
use crate::review::{NewReview, ReviewWorkflow, estimated_review_time};
use crate::routing::RoutingPolicy;
use crate::translation::{DispatchOutcome, Dispatcher, TranslationCache};

/// One utterance to translate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub context: Option<MedicalContext>,
    #[serde(default)]
    pub performance_mode: Option<PerformanceMode>,
    /// Generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
    /// Stored only as a pseudonym
    #[serde(default)]
    pub user_id: Option<String>,
}

impl GatewayRequest {
    pub fn new(text: impl Into<String>, source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            context: None,
            performance_mode: None,
            session_id: None,
            user_id: None,
        }
    }

    pub fn context(mut self, context: MedicalContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn mode(mut self, mode: PerformanceMode) -> Self {
        self.performance_mode = Some(mode);
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhiCompliance {
    pub score: f64,
    pub risk_level: RiskLevel,
    pub detected_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalAnalysis {
    pub contains_medical: bool,
    pub is_emergency: bool,
    pub criticality_score: u32,
    pub recommended_context: MedicalContext,
    pub detected_terms: Vec<String>,
}

impl From<&CriticalityResult> for MedicalAnalysis {
    fn from(result: &CriticalityResult) -> Self {
        Self {
            contains_medical: result.contains_medical,
            is_emergency: result.is_emergency,
            criticality_score: result.criticality_score,
            recommended_context: result.recommended_context,
            detected_terms: result.detected_terms.clone(),
        }
    }
}

/// A translation delivered to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredTranslation {
    pub session_id: String,
    pub translated_text: String,
    pub confidence: f64,
    pub method: String,
    pub context: MedicalContext,
    pub quality_score: f64,
    pub medical_accuracy: f64,
    pub cultural_appropriateness: f64,
    pub emergency_urgency_preserved: bool,
    pub phi_compliance: PhiCompliance,
    pub medical_analysis: MedicalAnalysis,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// A translation held for human review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReview {
    pub session_id: String,
    pub review_id: String,
    pub priority: Priority,
    pub estimated_review_time: String,
    /// Only when sharing unreviewed candidates is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GatewayResponse {
    Delivered(DeliveredTranslation),
    PendingReview(PendingReview),
}

impl GatewayResponse {
    pub fn is_pending_review(&self) -> bool {
        matches!(self, Self::PendingReview(_))
    }
}

/// Caller's context wins; a detected emergency always does
pub fn resolve_context(requested: Option<MedicalContext>, analysis: &CriticalityResult) -> MedicalContext {
    if analysis.is_emergency {
        return MedicalContext::Emergency;
    }
    requested.unwrap_or(analysis.recommended_context)
}

/// Reject malformed requests before anything else runs
pub fn validate_request(request: &GatewayRequest, max_chars: usize) -> Result<(), ValidationError> {
    if request.text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let actual = request.text.chars().count();
    if actual > max_chars {
        return Err(ValidationError::TextTooLong { max: max_chars, actual });
    }
    validate_request_language(&request.source_language)?;
    validate_request_language(&request.target_language)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TranslationGateway {
    config: GatewayConfig,
    audit_redactions: bool,
    detector: Arc<PhiDetector>,
    analyzer: CriticalityAnalyzer,
    routing: RoutingPolicy,
    dispatcher: Dispatcher,
    assessor: QualityAssessor,
    reviews: ReviewWorkflow,
    audit: AuditRecorder,
    ids: Arc<dyn IdGenerator>,
}

impl TranslationGateway {
    pub fn new(
        config: &Config,
        library: Arc<TermLibrary>,
        dispatcher: Dispatcher,
        reviews: ReviewWorkflow,
        audit: AuditRecorder,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            config: config.gateway.clone(),
            audit_redactions: config.redaction.audit_redactions,
            detector: Arc::new(PhiDetector::new(
                library.clone(),
                RedactionSettings::from(&config.redaction),
            )),
            analyzer: CriticalityAnalyzer::new(library.clone(), config.criticality.clone()),
            routing: RoutingPolicy::new(library.clone(), config.routing.clone()),
            dispatcher,
            assessor: QualityAssessor::new(library, config.quality.clone()),
            reviews,
            audit,
            ids,
        }
    }

    /// Wire the production collaborators: Ollama engines, SQLite store, configured channels
    pub fn from_config(config: &Config, repository: Repository) -> Result<Self> {
        let library = TermLibrary::with_custom_patterns(&config.redaction.custom_patterns)?.shared();

        let client = Arc::new(OllamaClient::from_config(&config.providers));
        let mut fast: Arc<dyn Translator> = Arc::new(OllamaTranslator::fast(client.clone(), &config.providers));
        if config.providers.use_emergency_phrasebook {
            fast = Arc::new(PhrasebookTranslator::new(fast));
        }
        let reasoning: Arc<dyn Translator> = Arc::new(OllamaTranslator::reasoning(client, &config.providers));
        let cache = TranslationCache::new(config.cache.enabled, Duration::from_secs(config.cache.ttl_secs));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);
        let repository = Arc::new(repository);
        let audit = AuditRecorder::new(repository.clone(), clock.clone(), ids.clone());
        let reviews = ReviewWorkflow::new(
            repository,
            notification::channels_from_config(&config.notifications),
            audit.clone(),
            clock,
            ids.clone(),
        );

        Ok(Self::new(
            config,
            library,
            Dispatcher::new(fast, reasoning, cache),
            reviews,
            audit,
            ids,
        ))
    }

    pub fn detector(&self) -> &PhiDetector {
        &self.detector
    }

    pub fn analyzer(&self) -> &CriticalityAnalyzer {
        &self.analyzer
    }

    pub fn reviews(&self) -> &ReviewWorkflow {
        &self.reviews
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Redaction off the async workers; a panic yields the worst-case result
    async fn redact(&self, text: &str, context: MedicalContext) -> RedactionResult {
        let detector = self.detector.clone();
        let owned = text.to_string();
        match tokio::task::spawn_blocking(move || detector.redact(&owned, context)).await {
            Ok(result) => result,
            Err(e) => {
                error!("PHI analysis failed, assuming worst case: {}", e);
                RedactionResult::worst_case(text)
            }
        }
    }

    /// Process one request to a delivered translation or a pending review
    pub async fn translate(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let started = Instant::now();
        validate_request(&request, self.config.max_text_chars)?;

        let session_id = request.session_id.clone().unwrap_or_else(|| self.ids.next_id());
        let source_language = request.source_language.trim().to_string();
        let target_language = request.target_language.trim().to_string();

        let analysis = self.analyzer.analyze(&request.text);
        let context = resolve_context(request.context, &analysis);

        let redaction = self.redact(&request.text, context).await;

        let route = self.routing.select(
            &redaction.redacted_text,
            &source_language,
            &target_language,
            context,
            request.performance_mode,
        );
        let translator_request = TranslatorRequest {
            text: redaction.redacted_text.clone(),
            source_language: source_language.clone(),
            target_language: target_language.clone(),
            context,
        };
        let timeout = Duration::from_millis(self.config.translator_timeout_ms);
        let dispatched = self.dispatcher.dispatch(&translator_request, &route, timeout).await;
        if let Some(reason) = &dispatched.fallback_reason {
            warn!("Session {} fell back to the source text: {}", session_id, reason);
        }

        let quality = self.assessor.assess(
            &redaction.redacted_text,
            &dispatched.translated_text,
            &source_language,
            &target_language,
            context,
        );

        let outcome = decide(&redaction, &quality);
        let trail = Trail {
            session_id: &session_id,
            request: &request,
            context,
            redaction: &redaction,
            quality: &quality,
            dispatched: &dispatched,
            started,
        };

        match outcome {
            Outcome::Hold(priority) => self.hold(trail, priority).await,
            Outcome::Deliver | Outcome::RedactAndDeliver => {
                self.dispatcher.remember(&translator_request, &dispatched);
                self.record_translation(&trail, false, None);
                info!(
                    "Session {} delivered via {} ({} context, quality {:.2})",
                    session_id, dispatched.method, context, quality.metrics.overall_quality
                );
                Ok(GatewayResponse::Delivered(DeliveredTranslation {
                    session_id: session_id.clone(),
                    translated_text: dispatched.translated_text.clone(),
                    confidence: dispatched.confidence,
                    method: dispatched.method.clone(),
                    context,
                    quality_score: quality.metrics.overall_quality,
                    medical_accuracy: quality.metrics.medical_accuracy,
                    cultural_appropriateness: quality.metrics.cultural_appropriateness,
                    emergency_urgency_preserved: quality.metrics.emergency_urgency_preserved,
                    phi_compliance: PhiCompliance {
                        score: redaction.compliance_score,
                        risk_level: redaction.risk_level,
                        detected_count: redaction.matches.len(),
                    },
                    medical_analysis: MedicalAnalysis::from(&analysis),
                    processing_time_ms: trail.elapsed_ms(),
                    fallback_reason: dispatched.fallback_reason.clone(),
                }))
            }
        }
    }

    async fn hold(&self, trail: Trail<'_>, priority: Priority) -> Result<GatewayResponse, GatewayError> {
        let mut flagged_issues = Vec::new();
        if trail.redaction.requires_manual_review {
            flagged_issues.push(format!(
                "Sensitive data requires manual review ({} risk)",
                trail.redaction.risk_level
            ));
        }
        if let Some(reason) = &trail.dispatched.fallback_reason {
            flagged_issues.push(format!("Translation unavailable: {}", reason));
        }
        flagged_issues.extend(trail.quality.flagged_issues.iter().cloned());

        let new_review = NewReview {
            session_id: trail.session_id.to_string(),
            original_text: trail.redaction.redacted_text.clone(),
            candidate_text: trail.dispatched.translated_text.clone(),
            source_language: trail.request.source_language.trim().to_string(),
            target_language: trail.request.target_language.trim().to_string(),
            context: trail.context,
            priority,
            quality_metrics: trail.quality.metrics,
            flagged_issues,
        };

        let review = match self.reviews.create(new_review).await {
            Ok(review) => review,
            Err(e) => {
                error!("Held translation for session {} could not be queued: {}", trail.session_id, e);
                self.record_translation(&trail, true, Some(format!("Review queue unavailable: {}", e)));
                return Err(GatewayError::ReviewUnavailable(e.to_string()));
            }
        };

        self.record_translation(&trail, true, None);
        info!(
            "Session {} held for review {} at {} priority",
            trail.session_id, review.id, priority
        );

        let share = self.config.share_unreviewed_candidate;
        Ok(GatewayResponse::PendingReview(PendingReview {
            session_id: trail.session_id.to_string(),
            review_id: review.id,
            priority,
            estimated_review_time: estimated_review_time(trail.context.is_emergency()).to_string(),
            translated_text: share.then(|| trail.dispatched.translated_text.clone()),
            quality_score: share.then_some(trail.quality.metrics.overall_quality),
        }))
    }

    fn record_translation(&self, trail: &Trail<'_>, held: bool, failure: Option<String>) {
        let mut event = self
            .audit
            .event(AuditEventType::Translation, trail.session_id)
            .languages(
                trail.request.source_language.trim(),
                trail.request.target_language.trim(),
            )
            .text_length(trail.request.text.chars().count())
            .confidence(trail.dispatched.confidence)
            .emergency(trail.context.is_emergency())
            .phi_detected(trail.redaction.has_phi())
            .processing_time_ms(trail.elapsed_ms())
            .quality_score(trail.quality.metrics.overall_quality)
            .human_review_required(held);

        if let Some(user) = &trail.request.user_id {
            event = event.user(user);
        }
        if self.audit_redactions && trail.redaction.has_phi() {
            let tokens: Vec<String> = trail
                .redaction
                .redaction_map
                .iter()
                .map(|(token, count)| format!("{}x{}", token, count))
                .collect();
            event = event.details(format!("REDACTED: {}", tokens.join(", ")));
        }

        event = match (failure, &trail.dispatched.fallback_reason) {
            (Some(message), _) => event.failed(message),
            (None, Some(reason)) => event.failed(reason.clone()),
            (None, None) if held => event.result(AuditResult::Partial),
            (None, None) => event,
        };
        self.audit.record(event);
    }
}

/// Per-request values threaded through delivery, hold and audit
struct Trail<'a> {
    session_id: &'a str,
    request: &'a GatewayRequest,
    context: MedicalContext,
    redaction: &'a RedactionResult,
    quality: &'a QualityAssessment,
    dispatched: &'a DispatchOutcome,
    started: Instant,
}

impl Trail<'_> {
    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
