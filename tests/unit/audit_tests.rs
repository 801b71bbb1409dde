/*!
 * Audit recording against the SQLite sink
 */

use chrono::Duration;
use std::sync::Arc;

use lifebridge::audit::compliance::{check_event, requires_immediate_review};
use lifebridge::audit::{
    AuditEvent, AuditEventType, AuditRecorder, AuditResult, AuditSink, ComplianceViolation, RETENTION_DAYS,
    pseudonymize,
};
use lifebridge::clock::{FixedClock, SequentialIds};
use lifebridge::database::Repository;
use lifebridge::dictionaries::patterns::Severity;
use lifebridge::errors::AuditError;

use crate::common::{init_logging, test_start};

fn recorder(repo: &Repository) -> AuditRecorder {
    AuditRecorder::new(
        Arc::new(repo.clone()),
        Arc::new(FixedClock::new(test_start())),
        Arc::new(SequentialIds::new("evt")),
    )
}

#[tokio::test]
async fn test_record_thenFlush_shouldPersistEveryField() {
    init_logging();
    let repo = Repository::new_in_memory().unwrap();
    let audit = recorder(&repo);

    let event = audit
        .event(AuditEventType::Translation, "s-1")
        .user("clinician-42")
        .languages("en", "es")
        .text_length(17)
        .confidence(0.8)
        .emergency(true)
        .phi_detected(false)
        .processing_time_ms(120)
        .quality_score(0.91)
        .human_review_required(true)
        .details("routine");
    audit.record(event.clone());
    audit.flush().await;

    let stored = repo.audit_events_for_session("s-1").await.unwrap();
    assert_eq!(stored, vec![event.clone()]);
    assert_eq!(stored[0].event_id, "evt-1");
    assert_eq!(stored[0].severity, Severity::Critical);
    assert_eq!(stored[0].user_id.as_deref(), Some(pseudonymize("clinician-42").as_str()));
    assert_eq!(stored[0].retain_until - stored[0].timestamp, Duration::days(RETENTION_DAYS));
}

#[tokio::test]
async fn test_append_withDuplicateId_shouldKeepFirstEvent() {
    let repo = Repository::new_in_memory().unwrap();
    let first = AuditEvent::new("evt-dup", test_start(), AuditEventType::Access, "s-2").details("first");
    let second = AuditEvent::new("evt-dup", test_start(), AuditEventType::Access, "s-2").details("second");

    repo.append(&first).await.unwrap();
    let err = repo.append(&second).await.unwrap_err();
    assert!(matches!(err, AuditError::DuplicateEvent(id) if id == "evt-dup"));

    let stored = repo.audit_events_for_session("s-2").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].details.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_record_withViolations_shouldStillPersist() {
    init_logging();
    let repo = Repository::new_in_memory().unwrap();
    let audit = recorder(&repo);

    audit.record(
        audit
            .event(AuditEventType::Translation, "s-3")
            .emergency(true)
            .phi_detected(true)
            .quality_score(0.5)
            .failed("engine down"),
    );
    audit.flush().await;

    assert_eq!(repo.count_audit_events().await.unwrap(), 1);
    let stored = repo.audit_events_for_session("s-3").await.unwrap();
    assert_eq!(stored[0].result, AuditResult::Failure);
    assert_eq!(stored[0].error_message.as_deref(), Some("engine down"));
}

#[test]
fn test_checkEvent_shouldListEveryEmergencyViolation() {
    let event = AuditEvent::new("e", test_start(), AuditEventType::Translation, "s")
        .emergency(true)
        .phi_detected(true)
        .processing_time_ms(31_000)
        .quality_score(0.5)
        .failed("timeout");

    let violations = check_event(&event);
    assert_eq!(
        violations,
        vec![
            ComplianceViolation::PhiDetected,
            ComplianceViolation::EmergencyResponseSlow,
            ComplianceViolation::EmergencyLowQuality,
            ComplianceViolation::EmergencyTranslationFailure,
        ]
    );
    assert!(requires_immediate_review(&event, &violations));
}

#[test]
fn test_checkEvent_withRoutineSuccess_shouldBeClean() {
    let event = AuditEvent::new("e", test_start(), AuditEventType::Translation, "s")
        .emergency(false)
        .phi_detected(false)
        .processing_time_ms(90_000)
        .quality_score(0.1);

    let violations = check_event(&event);
    assert!(violations.is_empty());
    assert!(!requires_immediate_review(&event, &violations));
}
