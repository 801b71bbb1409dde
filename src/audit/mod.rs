/*!
 * Audit trail for safety-relevant events.
 *
 * Every translation, escalation and reviewer action produces an
 * `AuditEvent`. Events are write-once: a sink must reject a second write
 * with the same event id instead of overwriting it. Recording never blocks
 * or fails the caller; each write runs on its own task and failures are
 * only logged. `AuditRecorder::flush` waits for outstanding writes.
 */

pub mod compliance;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Debug};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::clock::{Clock, IdGenerator};
use crate::dictionaries::patterns::Severity;
use crate::errors::AuditError;

pub use compliance::ComplianceViolation;

/// Retention window for audit records, in days (seven years)
pub const RETENTION_DAYS: i64 = 7 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Translation,
    Emergency,
    Access,
    Export,
    Deletion,
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Translation => "translation",
            Self::Emergency => "emergency",
            Self::Access => "access",
            Self::Export => "export",
            Self::Deletion => "deletion",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditEventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "translation" => Ok(Self::Translation),
            "emergency" => Ok(Self::Emergency),
            "access" => Ok(Self::Access),
            "export" => Ok(Self::Export),
            "deletion" => Ok(Self::Deletion),
            _ => Err(anyhow::anyhow!("Invalid audit event type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failure,
    Partial,
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditResult {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "partial" => Ok(Self::Partial),
            _ => Err(anyhow::anyhow!("Invalid audit result: {}", s)),
        }
    }
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub severity: Severity,
    pub session_id: String,
    pub result: AuditResult,
    /// SHA-256 of the caller's identifier, never the identifier itself
    pub user_id: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub text_length: Option<usize>,
    pub confidence: Option<f64>,
    pub emergency: Option<bool>,
    pub phi_detected: Option<bool>,
    pub error_message: Option<String>,
    pub processing_time_ms: Option<u64>,
    pub quality_score: Option<f64>,
    pub human_review_required: Option<bool>,
    pub details: Option<String>,
    pub retain_until: DateTime<Utc>,
}

/// Hex SHA-256 of an identifier
pub fn pseudonymize(user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl AuditEvent {
    /// A successful event with the default severity for its type
    pub fn new(
        event_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        event_type: AuditEventType,
        session_id: impl Into<String>,
    ) -> Self {
        let severity = match event_type {
            AuditEventType::Emergency => Severity::Critical,
            AuditEventType::Deletion | AuditEventType::Export => Severity::High,
            AuditEventType::Translation => Severity::Medium,
            AuditEventType::Access => Severity::Low,
        };
        Self {
            event_id: event_id.into(),
            timestamp,
            event_type,
            severity,
            session_id: session_id.into(),
            result: AuditResult::Success,
            user_id: None,
            source_language: None,
            target_language: None,
            text_length: None,
            confidence: None,
            emergency: None,
            phi_detected: None,
            error_message: None,
            processing_time_ms: None,
            quality_score: None,
            human_review_required: None,
            details: None,
            retain_until: timestamp + Duration::days(RETENTION_DAYS),
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn result(mut self, result: AuditResult) -> Self {
        self.result = result;
        self
    }

    /// Stores the pseudonym of `user_id`
    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = Some(pseudonymize(user_id));
        self
    }

    pub fn languages(mut self, source: &str, target: &str) -> Self {
        self.source_language = Some(source.to_string());
        self.target_language = Some(target.to_string());
        self
    }

    pub fn text_length(mut self, length: usize) -> Self {
        self.text_length = Some(length);
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Marks the event as emergency; translation events become critical
    pub fn emergency(mut self, emergency: bool) -> Self {
        self.emergency = Some(emergency);
        if emergency && self.event_type == AuditEventType::Translation {
            self.severity = Severity::Critical;
        }
        self
    }

    pub fn phi_detected(mut self, detected: bool) -> Self {
        self.phi_detected = Some(detected);
        self
    }

    /// Sets the error message and marks the result as failed
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self.result = AuditResult::Failure;
        self
    }

    pub fn processing_time_ms(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    pub fn quality_score(mut self, score: f64) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn human_review_required(mut self, required: bool) -> Self {
        self.human_review_required = Some(required);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Durable destination for audit events
#[async_trait]
pub trait AuditSink: Send + Sync + Debug {
    /// Persist `event`; a repeated event id fails with `AuditError::DuplicateEvent`
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Fire-and-forget front end to an `AuditSink`
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            sink,
            clock,
            ids,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start a new event stamped with a fresh id and the current time
    pub fn event(&self, event_type: AuditEventType, session_id: &str) -> AuditEvent {
        AuditEvent::new(self.ids.next_id(), self.clock.now(), event_type, session_id)
    }

    /// Check and persist `event` in the background
    pub fn record(&self, event: AuditEvent) {
        let violations = compliance::check_event(&event);
        if !violations.is_empty() {
            let names: Vec<&str> = violations.iter().map(|v| v.as_str()).collect();
            error!(
                "Compliance violation on audit event {} ({}): {}{}",
                event.event_id,
                event.event_type,
                names.join(", "),
                if compliance::requires_immediate_review(&event, &violations) {
                    " - immediate review required"
                } else {
                    ""
                }
            );
        }

        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            match sink.append(&event).await {
                Ok(()) => debug!("Recorded audit event {} ({})", event.event_id, event.event_type),
                Err(e) => warn!("Failed to record audit event {}: {}", event.event_id, e),
            }
        });

        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every write started so far
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Audit write task failed: {}", e);
            }
        }
    }
}
