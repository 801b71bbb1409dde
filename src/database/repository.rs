/*!
 * Repository over the review and audit tables.
 *
 * Implements `ReviewStore` and `AuditSink` so the workflow and the audit
 * recorder can run against SQLite. Audit rows are insert-only; a repeated
 * event id comes back as `AuditError::DuplicateEvent`.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};

use super::connection::DatabaseConnection;
use super::models::{AuditRecord, ReviewRecord, to_db_time};
use crate::audit::{AuditEvent, AuditSink};
use crate::errors::{AuditError, ReviewError};
use crate::review::{ReviewRequest, ReviewStatus, ReviewStore};

const REVIEW_COLUMNS: &str = "id, session_id, original_text, candidate_text, source_language, target_language, \
     context, priority, quality_metrics, flagged_issues, status, reviewer_id, notes, final_text, \
     created_at, updated_at, review_started_at, review_completed_at, escalation_reason, escalated_at, \
     urgent_contact, retain_until";

const AUDIT_COLUMNS: &str = "event_id, timestamp, event_type, severity, session_id, result, user_id, \
     source_language, target_language, text_length, confidence, emergency, phi_detected, error_message, \
     processing_time_ms, quality_score, human_review_required, details, retain_until";

#[derive(Debug, Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn new_default() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    /// In-memory database, for tests
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Review Operations
    // =========================================================================

    pub async fn insert_review(&self, review: &ReviewRequest) -> Result<()> {
        let record = ReviewRecord::from_review(review)?;

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO review_requests ({}) VALUES \
                         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
                        REVIEW_COLUMNS
                    ),
                    params![
                        record.id,
                        record.session_id,
                        record.original_text,
                        record.candidate_text,
                        record.source_language,
                        record.target_language,
                        record.context,
                        record.priority,
                        record.quality_metrics,
                        record.flagged_issues,
                        record.status,
                        record.reviewer_id,
                        record.notes,
                        record.final_text,
                        record.created_at,
                        record.updated_at,
                        record.review_started_at,
                        record.review_completed_at,
                        record.escalation_reason,
                        record.escalated_at,
                        record.urgent_contact,
                        record.retain_until,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Overwrite the mutable columns of an open review; returns false when no
    /// pending or in-review row has the id
    pub async fn update_review(&self, review: &ReviewRequest) -> Result<bool> {
        let record = ReviewRecord::from_review(review)?;

        self.db
            .execute_async(move |conn| {
                let changed = conn.execute(
                    r#"
                    UPDATE review_requests SET
                        priority = ?2, status = ?3, reviewer_id = ?4, notes = ?5, final_text = ?6,
                        updated_at = ?7, review_started_at = ?8, review_completed_at = ?9,
                        escalation_reason = ?10, escalated_at = ?11, urgent_contact = ?12
                    WHERE id = ?1 AND status IN ('pending', 'in_review')
                    "#,
                    params![
                        record.id,
                        record.priority,
                        record.status,
                        record.reviewer_id,
                        record.notes,
                        record.final_text,
                        record.updated_at,
                        record.review_started_at,
                        record.review_completed_at,
                        record.escalation_reason,
                        record.escalated_at,
                        record.urgent_contact,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    pub async fn get_review(&self, id: &str) -> Result<Option<ReviewRequest>> {
        let id = id.to_string();

        let record = self
            .db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        &format!("SELECT {} FROM review_requests WHERE id = ?1", REVIEW_COLUMNS),
                        [id],
                        review_record_from_row,
                    )
                    .optional()?;
                Ok(record)
            })
            .await?;

        record.map(ReviewRecord::into_review).transpose()
    }

    pub async fn reviews_with_status(&self, statuses: &[ReviewStatus]) -> Result<Vec<ReviewRequest>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();

        let records = self
            .db
            .execute_async(move |conn| {
                let placeholders: Vec<String> = (1..=statuses.len()).map(|i| format!("?{}", i)).collect();
                let sql = format!(
                    "SELECT {} FROM review_requests WHERE status IN ({}) ORDER BY created_at DESC",
                    REVIEW_COLUMNS,
                    placeholders.join(", ")
                );
                query_reviews(conn, &sql, rusqlite::params_from_iter(statuses.iter()))
            })
            .await?;

        records.into_iter().map(ReviewRecord::into_review).collect()
    }

    pub async fn reviews_created_since(&self, since: DateTime<Utc>) -> Result<Vec<ReviewRequest>> {
        let since = to_db_time(&since);

        let records = self
            .db
            .execute_async(move |conn| {
                let sql = format!(
                    "SELECT {} FROM review_requests WHERE created_at >= ?1 ORDER BY created_at DESC",
                    REVIEW_COLUMNS
                );
                query_reviews(conn, &sql, [since])
            })
            .await?;

        records.into_iter().map(ReviewRecord::into_review).collect()
    }

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// Insert an audit row; returns false when the event id already exists
    pub async fn insert_audit_event(&self, event: &AuditEvent) -> Result<bool> {
        let record = AuditRecord::from(event);

        self.db
            .execute_async(move |conn| {
                let result = conn.execute(
                    &format!(
                        "INSERT INTO audit_events ({}) VALUES \
                         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                        AUDIT_COLUMNS
                    ),
                    params![
                        record.event_id,
                        record.timestamp,
                        record.event_type,
                        record.severity,
                        record.session_id,
                        record.result,
                        record.user_id,
                        record.source_language,
                        record.target_language,
                        record.text_length,
                        record.confidence,
                        record.emergency,
                        record.phi_detected,
                        record.error_message,
                        record.processing_time_ms,
                        record.quality_score,
                        record.human_review_required,
                        record.details,
                        record.retain_until,
                    ],
                );
                match result {
                    Ok(_) => Ok(true),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    /// Events for one session, oldest first
    pub async fn audit_events_for_session(&self, session_id: &str) -> Result<Vec<AuditEvent>> {
        let session_id = session_id.to_string();

        let records = self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM audit_events WHERE session_id = ?1 ORDER BY timestamp ASC, event_id ASC",
                    AUDIT_COLUMNS
                ))?;
                let rows = stmt.query_map([session_id], audit_record_from_row)?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await?;

        records.into_iter().map(AuditRecord::into_event).collect()
    }

    pub async fn count_audit_events(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM audit_events", [], |row| row.get(0))?)
            })
            .await
    }
}

fn query_reviews<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<ReviewRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, review_record_from_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

fn review_record_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        original_text: row.get(2)?,
        candidate_text: row.get(3)?,
        source_language: row.get(4)?,
        target_language: row.get(5)?,
        context: row.get(6)?,
        priority: row.get(7)?,
        quality_metrics: row.get(8)?,
        flagged_issues: row.get(9)?,
        status: row.get(10)?,
        reviewer_id: row.get(11)?,
        notes: row.get(12)?,
        final_text: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
        review_started_at: row.get(16)?,
        review_completed_at: row.get(17)?,
        escalation_reason: row.get(18)?,
        escalated_at: row.get(19)?,
        urgent_contact: row.get(20)?,
        retain_until: row.get(21)?,
    })
}

fn audit_record_from_row(row: &Row<'_>) -> rusqlite::Result<AuditRecord> {
    Ok(AuditRecord {
        event_id: row.get(0)?,
        timestamp: row.get(1)?,
        event_type: row.get(2)?,
        severity: row.get(3)?,
        session_id: row.get(4)?,
        result: row.get(5)?,
        user_id: row.get(6)?,
        source_language: row.get(7)?,
        target_language: row.get(8)?,
        text_length: row.get(9)?,
        confidence: row.get(10)?,
        emergency: row.get(11)?,
        phi_detected: row.get(12)?,
        error_message: row.get(13)?,
        processing_time_ms: row.get(14)?,
        quality_score: row.get(15)?,
        human_review_required: row.get(16)?,
        details: row.get(17)?,
        retain_until: row.get(18)?,
    })
}

// =========================================================================
// Collaborator Traits
// =========================================================================

#[async_trait]
impl ReviewStore for Repository {
    async fn create(&self, review: &ReviewRequest) -> Result<(), ReviewError> {
        Ok(self.insert_review(review).await?)
    }

    async fn get(&self, id: &str) -> Result<Option<ReviewRequest>, ReviewError> {
        Ok(self.get_review(id).await?)
    }

    async fn save(&self, review: &ReviewRequest) -> Result<(), ReviewError> {
        if self.update_review(review).await? {
            return Ok(());
        }
        match self.get_review(&review.id).await? {
            Some(current) => Err(ReviewError::InvalidState {
                id: review.id.clone(),
                status: current.status.to_string(),
                action: "updated".to_string(),
            }),
            None => Err(ReviewError::NotFound(review.id.clone())),
        }
    }

    async fn list(&self, statuses: &[ReviewStatus]) -> Result<Vec<ReviewRequest>, ReviewError> {
        Ok(self.reviews_with_status(statuses).await?)
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<ReviewRequest>, ReviewError> {
        Ok(self.reviews_created_since(since).await?)
    }
}

#[async_trait]
impl AuditSink for Repository {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        match self.insert_audit_event(event).await {
            Ok(true) => {
                debug!("Stored audit event {}", event.event_id);
                Ok(())
            }
            Ok(false) => Err(AuditError::DuplicateEvent(event.event_id.clone())),
            Err(e) => Err(AuditError::Sink(e.to_string())),
        }
    }
}
