/*!
 * Review workflow against a file-backed store
 */

use chrono::Duration;
use std::sync::Arc;
use tempfile::TempDir;

use lifebridge::audit::AuditRecorder;
use lifebridge::clock::{FixedClock, SequentialIds};
use lifebridge::database::{DatabaseConnection, Repository};
use lifebridge::models::{MedicalContext, Priority};
use lifebridge::notification::{NotificationChannel, RecordingNotifier};
use lifebridge::quality::QualityMetrics;
use lifebridge::review::{NewReview, ReviewDecision, ReviewStatus, ReviewWorkflow};

use crate::common::{init_logging, test_start};

fn new_review(priority: Priority, context: MedicalContext) -> NewReview {
    NewReview {
        session_id: "s-1".to_string(),
        original_text: "My SSN is [SSN-REDACTED]".to_string(),
        candidate_text: "Mi SSN es [SSN-REDACTED]".to_string(),
        source_language: "en".to_string(),
        target_language: "es".to_string(),
        context,
        priority,
        quality_metrics: QualityMetrics::fallback(),
        flagged_issues: vec!["Sensitive data requires manual review (critical risk)".to_string()],
    }
}

fn workflow(
    repo: &Repository,
    clock: Arc<FixedClock>,
    notifier: &RecordingNotifier,
    ids: &str,
) -> (ReviewWorkflow, AuditRecorder) {
    let sink = Arc::new(repo.clone());
    let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(notifier.clone())];
    let audit = AuditRecorder::new(sink.clone(), clock.clone(), Arc::new(SequentialIds::new(&format!("{}-evt", ids))));
    let reviews = ReviewWorkflow::new(sink, channels, audit.clone(), clock, Arc::new(SequentialIds::new(ids)));
    (reviews, audit)
}

#[tokio::test]
async fn test_workflow_afterReopeningDatabase_shouldResumeOpenReview() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.db");
    let clock = Arc::new(FixedClock::new(test_start()));
    let notifier = RecordingNotifier::new();

    let id = {
        let repo = Repository::new(DatabaseConnection::new(&path).unwrap());
        let (reviews, audit) = workflow(&repo, clock.clone(), &notifier, "rev");
        let review = reviews.create(new_review(Priority::High, MedicalContext::General)).await.unwrap();
        reviews.claim(&review.id, "nurse-7").await.unwrap();
        audit.flush().await;
        review.id
    };

    clock.advance(Duration::minutes(5));
    let repo = Repository::new(DatabaseConnection::new(&path).unwrap());
    let (reviews, audit) = workflow(&repo, clock.clone(), &notifier, "rev-b");

    let resumed = reviews.get(&id).await.unwrap();
    assert_eq!(resumed.status, ReviewStatus::InReview);
    assert_eq!(resumed.reviewer_id.as_deref(), Some("nurse-7"));

    let done = reviews
        .submit_review(&id, "nurse-7", ReviewDecision::Approved, None, Some("Mi número es privado".to_string()))
        .await
        .unwrap();
    assert_eq!(done.final_text.as_deref(), Some("Mi número es privado"));
    assert_eq!(done.review_seconds(), Some(300.0));

    audit.flush().await;
    let trail = repo.audit_events_for_session("s-1").await.unwrap();
    assert_eq!(trail.len(), 2);
}

#[tokio::test]
async fn test_create_withHighPriority_shouldAlertReviewers() {
    init_logging();
    let repo = Repository::new_in_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let (reviews, _audit) = workflow(&repo, Arc::new(FixedClock::new(test_start())), &notifier, "rev");

    let high = reviews.create(new_review(Priority::High, MedicalContext::General)).await.unwrap();
    reviews.create(new_review(Priority::Low, MedicalContext::General)).await.unwrap();

    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "HIGH Priority Translation Review Required");
    assert_eq!(alerts[0].review_id.as_deref(), Some(high.id.as_str()));
    assert!(alerts[0].message.contains("Sensitive data requires manual review"));
}

#[tokio::test]
async fn test_create_withFailingChannel_shouldStillOpenReview() {
    init_logging();
    let repo = Repository::new_in_memory().unwrap();
    let notifier = RecordingNotifier::failing();
    let (reviews, _audit) = workflow(&repo, Arc::new(FixedClock::new(test_start())), &notifier, "rev");

    let review = reviews.create(new_review(Priority::Critical, MedicalContext::Emergency)).await.unwrap();
    assert_eq!(review.status, ReviewStatus::Pending);
    assert!(notifier.alerts().is_empty());

    let stored = reviews.get(&review.id).await.unwrap();
    assert_eq!(stored, review);
}
