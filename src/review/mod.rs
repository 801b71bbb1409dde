/*!
 * Human review workflow for held translations.
 *
 * The gateway opens a review whenever a translation is held. Reviewers
 * list the queue, claim an item, and submit a terminal decision; anyone
 * may escalate an open item to critical priority. Reviews are never
 * deleted. Alerts and audit writes are best effort and never fail an
 * operation.
 */

pub mod metrics;
pub mod models;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

use crate::audit::{AuditEventType, AuditRecorder};
use crate::clock::{Clock, IdGenerator};
use crate::dictionaries::patterns::Severity;
use crate::errors::ReviewError;
use crate::models::Priority;
use crate::notification::{self, Alert, NotificationChannel};

pub use metrics::{ReviewMetrics, parse_timeframe};
pub use models::{NewReview, ReviewDecision, ReviewRequest, ReviewStatus};

/// Session id used for audit events not tied to one review
pub const QUEUE_SESSION: &str = "review-queue";

pub const ESCALATION_SUBJECT: &str = "EMERGENCY: Critical Translation Review Escalated";

/// Durable storage for review requests
#[async_trait]
pub trait ReviewStore: Send + Sync + Debug {
    async fn create(&self, review: &ReviewRequest) -> Result<(), ReviewError>;

    async fn get(&self, id: &str) -> Result<Option<ReviewRequest>, ReviewError>;

    /// Overwrites the stored request with the same id
    async fn save(&self, review: &ReviewRequest) -> Result<(), ReviewError>;

    async fn list(&self, statuses: &[ReviewStatus]) -> Result<Vec<ReviewRequest>, ReviewError>;

    /// Requests created at or after `since`, any status
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<ReviewRequest>, ReviewError>;
}

/// Expected wait quoted to the caller of a held request
pub fn estimated_review_time(emergency: bool) -> &'static str {
    if emergency { "30 seconds" } else { "5-10 minutes" }
}

pub fn creation_subject(priority: Priority) -> String {
    format!("{} Priority Translation Review Required", priority.as_str().to_uppercase())
}

/// Highest priority first, newest first within a priority
pub fn sort_queue(reviews: &mut [ReviewRequest]) {
    reviews.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationOutcome {
    pub review: ReviewRequest,
    pub notifications_sent: usize,
}

#[derive(Debug, Clone)]
pub struct ReviewWorkflow {
    store: Arc<dyn ReviewStore>,
    notifiers: Vec<Arc<dyn NotificationChannel>>,
    audit: AuditRecorder,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ReviewWorkflow {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        notifiers: Vec<Arc<dyn NotificationChannel>>,
        audit: AuditRecorder,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            notifiers,
            audit,
            clock,
            ids,
        }
    }

    async fn load(&self, id: &str) -> Result<ReviewRequest, ReviewError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(id.to_string()))
    }

    /// Open a pending review and alert reviewers when the priority is high
    pub async fn create(&self, new: NewReview) -> Result<ReviewRequest, ReviewError> {
        let review = ReviewRequest::open(self.ids.next_id(), new, self.clock.now());
        self.store.create(&review).await?;
        info!(
            "Opened review {} ({} priority, {} context)",
            review.id, review.priority, review.context
        );

        if review.priority.alerts_on_creation() {
            let alert = Alert {
                subject: creation_subject(review.priority),
                message: format!(
                    "Review {} ({} -> {}, {} context) needs a reviewer. Issues: {}",
                    review.id,
                    review.source_language,
                    review.target_language,
                    review.context,
                    if review.flagged_issues.is_empty() {
                        "none".to_string()
                    } else {
                        review.flagged_issues.join("; ")
                    }
                ),
                priority: review.priority,
                review_id: Some(review.id.clone()),
            };
            let sent = notification::broadcast(&self.notifiers, &alert).await;
            if sent == 0 {
                warn!("No reviewer was alerted about review {}", review.id);
            }
        }
        Ok(review)
    }

    pub async fn get(&self, id: &str) -> Result<ReviewRequest, ReviewError> {
        self.load(id).await
    }

    /// pending -> in_review
    pub async fn claim(&self, id: &str, reviewer_id: &str) -> Result<ReviewRequest, ReviewError> {
        let mut review = self.load(id).await?;
        review.claim(reviewer_id, self.clock.now())?;
        self.store.save(&review).await?;

        self.audit.record(
            self.audit
                .event(AuditEventType::Access, &review.session_id)
                .user(reviewer_id)
                .details(format!("CLAIMED: {}", review.id)),
        );
        Ok(review)
    }

    /// Record a reviewer's decision; failures are audited before they are returned
    pub async fn submit_review(
        &self,
        id: &str,
        reviewer_id: &str,
        decision: ReviewDecision,
        notes: Option<String>,
        final_text: Option<String>,
    ) -> Result<ReviewRequest, ReviewError> {
        let started = self.clock.now();
        let result = self.complete(id, reviewer_id, decision, notes, final_text).await;
        let elapsed_ms = (self.clock.now() - started).num_milliseconds().max(0) as u64;

        match &result {
            Ok(review) => {
                info!("Review {} {} by reviewer", review.id, review.status);
                let severity = if review.priority == Priority::Critical {
                    Severity::Critical
                } else {
                    Severity::Medium
                };
                self.audit.record(
                    self.audit
                        .event(AuditEventType::Access, &review.session_id)
                        .severity(severity)
                        .user(reviewer_id)
                        .processing_time_ms(elapsed_ms)
                        .details(format!("REVIEWED: {} {}", review.id, decision)),
                );
            }
            Err(e) => {
                warn!("Review submission for {} failed: {}", id, e);
                self.audit.record(
                    self.audit
                        .event(AuditEventType::Access, id)
                        .severity(Severity::High)
                        .user(reviewer_id)
                        .processing_time_ms(elapsed_ms)
                        .failed(e.to_string()),
                );
            }
        }
        result
    }

    async fn complete(
        &self,
        id: &str,
        reviewer_id: &str,
        decision: ReviewDecision,
        notes: Option<String>,
        final_text: Option<String>,
    ) -> Result<ReviewRequest, ReviewError> {
        let mut review = self.load(id).await?;
        review.complete(reviewer_id, decision, notes, final_text, self.clock.now())?;
        self.store.save(&review).await?;
        Ok(review)
    }

    /// Force critical priority and page reviewers
    pub async fn escalate(
        &self,
        id: &str,
        reason: &str,
        urgent_contact: Option<String>,
    ) -> Result<EscalationOutcome, ReviewError> {
        let mut review = self.load(id).await?;
        if review.priority == Priority::Critical {
            info!("Review {} is already critical; escalating again", review.id);
        }
        review.escalate(reason, urgent_contact, self.clock.now())?;
        self.store.save(&review).await?;

        let alert = Alert {
            subject: ESCALATION_SUBJECT.to_string(),
            message: format!(
                "Review {} ({} context, {}) escalated: {}{}",
                review.id,
                review.context,
                review.status,
                reason,
                review
                    .urgent_contact
                    .as_ref()
                    .map(|c| format!(". Urgent contact: {}", c))
                    .unwrap_or_default()
            ),
            priority: Priority::Critical,
            review_id: Some(review.id.clone()),
        };
        let notifications_sent = notification::broadcast(&self.notifiers, &alert).await;

        self.audit.record(
            self.audit
                .event(AuditEventType::Emergency, &review.session_id)
                .emergency(true)
                .details(format!("ESCALATED: {}", reason)),
        );

        Ok(EscalationOutcome {
            review,
            notifications_sent,
        })
    }

    /// Open reviews, optionally narrowed to one priority and/or emergencies
    pub async fn list_pending(
        &self,
        priority: Option<Priority>,
        emergency_only: bool,
    ) -> Result<Vec<ReviewRequest>, ReviewError> {
        let mut reviews: Vec<ReviewRequest> = self
            .store
            .list(&ReviewStatus::OPEN)
            .await?
            .into_iter()
            .filter(|r| priority.is_none_or(|p| r.priority == p))
            .filter(|r| !emergency_only || r.is_emergency())
            .collect();
        sort_queue(&mut reviews);

        self.audit.record(
            self.audit
                .event(AuditEventType::Access, QUEUE_SESSION)
                .details(format!("LISTED: {} open reviews", reviews.len())),
        );
        Ok(reviews)
    }

    /// Aggregates over reviews created within `timeframe` of now
    pub async fn metrics(&self, timeframe: &str) -> Result<ReviewMetrics, ReviewError> {
        let window = parse_timeframe(timeframe)?;
        let label = if timeframe.trim().is_empty() {
            metrics::DEFAULT_TIMEFRAME
        } else {
            timeframe.trim()
        };
        let reviews = self.store.list_since(self.clock.now() - window).await?;
        Ok(ReviewMetrics::from_reviews(label, &reviews))
    }
}
