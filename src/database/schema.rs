/*!
 * Table definitions and schema versioning.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 1;

/// Create the schema on a fresh database; safe to call on every open
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version != SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unsupported database schema v{} (expected v{})",
            current_version,
            SCHEMA_VERSION
        ));
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Reviews are never deleted; retain_until marks the compliance window
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS review_requests (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            original_text TEXT NOT NULL,
            candidate_text TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            context TEXT NOT NULL,
            priority TEXT NOT NULL,
            quality_metrics TEXT NOT NULL,
            flagged_issues TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            reviewer_id TEXT,
            notes TEXT,
            final_text TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            review_started_at TEXT,
            review_completed_at TEXT,
            escalation_reason TEXT,
            escalated_at TEXT,
            urgent_contact TEXT,
            retain_until TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_status ON review_requests(status);
        CREATE INDEX IF NOT EXISTS idx_reviews_created ON review_requests(created_at);
        "#,
    )?;

    // event_id is the write-once key: a second insert fails
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS audit_events (
            event_id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            session_id TEXT NOT NULL,
            result TEXT NOT NULL,
            user_id TEXT,
            source_language TEXT,
            target_language TEXT,
            text_length INTEGER,
            confidence REAL,
            emergency INTEGER,
            phi_detected INTEGER,
            error_message TEXT,
            processing_time_ms INTEGER,
            quality_score REAL,
            human_review_required INTEGER,
            details TEXT,
            retain_until TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_session ON audit_events(session_id);
        CREATE INDEX IF NOT EXISTS idx_audit_type ON audit_events(event_type);
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}
