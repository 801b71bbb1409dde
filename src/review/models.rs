/*!
 * Review request entity and its state machine.
 *
 * A request starts `pending`, may be claimed into `in_review`, and ends in
 * exactly one of the terminal states through a reviewer decision. Priority
 * is an overlay that escalation can raise without touching the status.
 * Every transition is a method here; the workflow only loads, calls and
 * saves.
 */

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ReviewError;
use crate::models::{MedicalContext, Priority};
use crate::quality::QualityMetrics;

/// Retention window for review records, in days (seven years)
pub const REVIEW_RETENTION_DAYS: i64 = 7 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    RequiresRevision,
}

impl ReviewStatus {
    /// Statuses that still await a reviewer
    pub const OPEN: [ReviewStatus; 2] = [ReviewStatus::Pending, ReviewStatus::InReview];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::RequiresRevision)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RequiresRevision => "requires_revision",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "requires_revision" => Ok(Self::RequiresRevision),
            _ => Err(anyhow::anyhow!("Invalid review status: {}", s)),
        }
    }
}

/// A reviewer's verdict; only terminal outcomes are expressible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    RequiresRevision,
}

impl From<ReviewDecision> for ReviewStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::Approved,
            ReviewDecision::Rejected => Self::Rejected,
            ReviewDecision::RequiresRevision => Self::RequiresRevision,
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ReviewStatus::from(*self))
    }
}

impl std::str::FromStr for ReviewDecision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "requires_revision" => Ok(Self::RequiresRevision),
            _ => Err(anyhow::anyhow!("Invalid review decision: {}", s)),
        }
    }
}

/// Everything needed to open a review for a held translation
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub session_id: String,
    /// Redacted source text
    pub original_text: String,
    pub candidate_text: String,
    pub source_language: String,
    pub target_language: String,
    pub context: MedicalContext,
    pub priority: Priority,
    pub quality_metrics: QualityMetrics,
    pub flagged_issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub id: String,
    pub session_id: String,
    pub original_text: String,
    pub candidate_text: String,
    pub source_language: String,
    pub target_language: String,
    pub context: MedicalContext,
    pub priority: Priority,
    pub quality_metrics: QualityMetrics,
    pub flagged_issues: Vec<String>,
    pub status: ReviewStatus,
    pub reviewer_id: Option<String>,
    pub notes: Option<String>,
    pub final_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub review_started_at: Option<DateTime<Utc>>,
    pub review_completed_at: Option<DateTime<Utc>>,
    pub escalation_reason: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub urgent_contact: Option<String>,
    pub retain_until: DateTime<Utc>,
}

impl ReviewRequest {
    pub fn open(id: String, new: NewReview, now: DateTime<Utc>) -> Self {
        Self {
            id,
            session_id: new.session_id,
            original_text: new.original_text,
            candidate_text: new.candidate_text,
            source_language: new.source_language,
            target_language: new.target_language,
            context: new.context,
            priority: new.priority,
            quality_metrics: new.quality_metrics,
            flagged_issues: new.flagged_issues,
            status: ReviewStatus::Pending,
            reviewer_id: None,
            notes: None,
            final_text: None,
            created_at: now,
            updated_at: now,
            review_started_at: None,
            review_completed_at: None,
            escalation_reason: None,
            escalated_at: None,
            urgent_contact: None,
            retain_until: now + Duration::days(REVIEW_RETENTION_DAYS),
        }
    }

    /// Critical priority or emergency context
    pub fn is_emergency(&self) -> bool {
        self.priority == Priority::Critical || self.context.is_emergency()
    }

    fn invalid(&self, action: &str) -> ReviewError {
        ReviewError::InvalidState {
            id: self.id.clone(),
            status: self.status.to_string(),
            action: action.to_string(),
        }
    }

    /// pending -> in_review
    pub fn claim(&mut self, reviewer_id: &str, now: DateTime<Utc>) -> Result<(), ReviewError> {
        if self.status != ReviewStatus::Pending {
            return Err(self.invalid("claimed"));
        }
        self.status = ReviewStatus::InReview;
        self.reviewer_id = Some(reviewer_id.to_string());
        self.review_started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// pending | in_review -> terminal; the final text defaults to the candidate
    pub fn complete(
        &mut self,
        reviewer_id: &str,
        decision: ReviewDecision,
        notes: Option<String>,
        final_text: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ReviewError> {
        if self.status.is_terminal() {
            return Err(self.invalid("submitted"));
        }
        self.status = decision.into();
        self.reviewer_id = Some(reviewer_id.to_string());
        self.notes = notes;
        self.final_text = Some(final_text.unwrap_or_else(|| self.candidate_text.clone()));
        self.review_completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Forces critical priority; the status is left as it is
    pub fn escalate(
        &mut self,
        reason: &str,
        urgent_contact: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ReviewError> {
        if self.status.is_terminal() {
            return Err(self.invalid("escalated"));
        }
        self.priority = Priority::Critical;
        self.escalation_reason = Some(reason.to_string());
        self.escalated_at = Some(now);
        self.urgent_contact = urgent_contact;
        self.updated_at = now;
        Ok(())
    }

    /// Seconds between creation and completion, for finished reviews
    pub fn review_seconds(&self) -> Option<f64> {
        self.review_completed_at
            .map(|done| (done - self.created_at).num_milliseconds() as f64 / 1000.0)
    }
}
