/*!
 * Row-level records for the persisted tables.
 *
 * Records mirror the columns one to one. Enumerations are stored as their
 * snake_case names, timestamps as RFC 3339 UTC text with millisecond
 * precision (so text order is time order), and nested values as JSON.
 */

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::audit::AuditEvent;
use crate::review::ReviewRequest;

pub fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_db_time(text: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("Invalid stored timestamp: {}", text))?
        .with_timezone(&Utc))
}

fn from_db_time_opt(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.as_deref().map(from_db_time).transpose()
}

/// A row of `review_requests`
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub id: String,
    pub session_id: String,
    pub original_text: String,
    pub candidate_text: String,
    pub source_language: String,
    pub target_language: String,
    pub context: String,
    pub priority: String,
    pub quality_metrics: String,
    pub flagged_issues: String,
    pub status: String,
    pub reviewer_id: Option<String>,
    pub notes: Option<String>,
    pub final_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub review_started_at: Option<String>,
    pub review_completed_at: Option<String>,
    pub escalation_reason: Option<String>,
    pub escalated_at: Option<String>,
    pub urgent_contact: Option<String>,
    pub retain_until: String,
}

impl ReviewRecord {
    pub fn from_review(review: &ReviewRequest) -> Result<Self> {
        Ok(Self {
            id: review.id.clone(),
            session_id: review.session_id.clone(),
            original_text: review.original_text.clone(),
            candidate_text: review.candidate_text.clone(),
            source_language: review.source_language.clone(),
            target_language: review.target_language.clone(),
            context: review.context.to_string(),
            priority: review.priority.to_string(),
            quality_metrics: serde_json::to_string(&review.quality_metrics)?,
            flagged_issues: serde_json::to_string(&review.flagged_issues)?,
            status: review.status.to_string(),
            reviewer_id: review.reviewer_id.clone(),
            notes: review.notes.clone(),
            final_text: review.final_text.clone(),
            created_at: to_db_time(&review.created_at),
            updated_at: to_db_time(&review.updated_at),
            review_started_at: review.review_started_at.as_ref().map(to_db_time),
            review_completed_at: review.review_completed_at.as_ref().map(to_db_time),
            escalation_reason: review.escalation_reason.clone(),
            escalated_at: review.escalated_at.as_ref().map(to_db_time),
            urgent_contact: review.urgent_contact.clone(),
            retain_until: to_db_time(&review.retain_until),
        })
    }

    pub fn into_review(self) -> Result<ReviewRequest> {
        Ok(ReviewRequest {
            context: self.context.parse()?,
            priority: self.priority.parse()?,
            quality_metrics: serde_json::from_str(&self.quality_metrics)
                .context("Invalid stored quality metrics")?,
            flagged_issues: serde_json::from_str(&self.flagged_issues)
                .context("Invalid stored flagged issues")?,
            status: self.status.parse()?,
            created_at: from_db_time(&self.created_at)?,
            updated_at: from_db_time(&self.updated_at)?,
            review_started_at: from_db_time_opt(self.review_started_at)?,
            review_completed_at: from_db_time_opt(self.review_completed_at)?,
            escalated_at: from_db_time_opt(self.escalated_at)?,
            retain_until: from_db_time(&self.retain_until)?,
            id: self.id,
            session_id: self.session_id,
            original_text: self.original_text,
            candidate_text: self.candidate_text,
            source_language: self.source_language,
            target_language: self.target_language,
            reviewer_id: self.reviewer_id,
            notes: self.notes,
            final_text: self.final_text,
            escalation_reason: self.escalation_reason,
            urgent_contact: self.urgent_contact,
        })
    }
}

/// A row of `audit_events`
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub event_id: String,
    pub timestamp: String,
    pub event_type: String,
    pub severity: String,
    pub session_id: String,
    pub result: String,
    pub user_id: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub text_length: Option<i64>,
    pub confidence: Option<f64>,
    pub emergency: Option<bool>,
    pub phi_detected: Option<bool>,
    pub error_message: Option<String>,
    pub processing_time_ms: Option<i64>,
    pub quality_score: Option<f64>,
    pub human_review_required: Option<bool>,
    pub details: Option<String>,
    pub retain_until: String,
}

impl From<&AuditEvent> for AuditRecord {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            timestamp: to_db_time(&event.timestamp),
            event_type: event.event_type.to_string(),
            severity: event.severity.to_string(),
            session_id: event.session_id.clone(),
            result: event.result.to_string(),
            user_id: event.user_id.clone(),
            source_language: event.source_language.clone(),
            target_language: event.target_language.clone(),
            text_length: event.text_length.map(|n| n as i64),
            confidence: event.confidence,
            emergency: event.emergency,
            phi_detected: event.phi_detected,
            error_message: event.error_message.clone(),
            processing_time_ms: event.processing_time_ms.map(|ms| ms as i64),
            quality_score: event.quality_score,
            human_review_required: event.human_review_required,
            details: event.details.clone(),
            retain_until: to_db_time(&event.retain_until),
        }
    }
}

impl AuditRecord {
    pub fn into_event(self) -> Result<AuditEvent> {
        Ok(AuditEvent {
            timestamp: from_db_time(&self.timestamp)?,
            event_type: self.event_type.parse()?,
            severity: self.severity.parse()?,
            result: self.result.parse()?,
            text_length: self.text_length.map(|n| n.max(0) as usize),
            processing_time_ms: self.processing_time_ms.map(|ms| ms.max(0) as u64),
            retain_until: from_db_time(&self.retain_until)?,
            event_id: self.event_id,
            session_id: self.session_id,
            user_id: self.user_id,
            source_language: self.source_language,
            target_language: self.target_language,
            confidence: self.confidence,
            emergency: self.emergency,
            phi_detected: self.phi_detected,
            error_message: self.error_message,
            quality_score: self.quality_score,
            human_review_required: self.human_review_required,
            details: self.details,
        })
    }
}
