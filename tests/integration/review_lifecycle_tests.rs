/*!
 * Review lifecycle driven through the gateway: hold, list, claim, decide, escalate.
 */

use chrono::Duration;

use lifebridge::audit::{AuditEventType, AuditResult};
use lifebridge::errors::{GatewayError, ReviewError};
use lifebridge::gateway::{GatewayRequest, GatewayResponse};
use lifebridge::models::Priority;
use lifebridge::providers::TranslatorRequest;
use lifebridge::providers::mock::MockTranslator;
use lifebridge::review::{ESCALATION_SUBJECT, ReviewDecision, ReviewStatus};

use crate::common::{TestGateway, TestGatewayBuilder, test_gateway};

fn add_fever(request: &TranslatorRequest) -> String {
    format!("{} with fever", request.text)
}

async fn hold(t: &TestGateway, text: &str) -> String {
    match t.gateway.translate(GatewayRequest::new(text, "en", "es")).await.unwrap() {
        GatewayResponse::PendingReview(p) => p.review_id,
        other => panic!("expected a pending review, got {:?}", other),
    }
}

#[tokio::test]
async fn test_review_claimThenApprove_shouldReachTerminalStateAndAudit() {
    let t = test_gateway();
    let id = hold(&t, "My SSN is 123-45-6789").await;

    let claimed = t.gateway.reviews().claim(&id, "nurse-7").await.unwrap();
    assert_eq!(claimed.status, ReviewStatus::InReview);
    assert!(claimed.review_started_at.is_some());

    t.clock.advance(Duration::minutes(4));
    let approved = t
        .gateway
        .reviews()
        .submit_review(
            &id,
            "nurse-7",
            ReviewDecision::Approved,
            Some("identifier masked correctly".to_string()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(approved.status, ReviewStatus::Approved);
    assert_eq!(approved.final_text.as_deref(), Some(approved.candidate_text.as_str()));
    assert_eq!(approved.reviewer_id.as_deref(), Some("nurse-7"));

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session(&approved.session_id).await.unwrap();
    let access: Vec<_> = events.iter().filter(|e| e.event_type == AuditEventType::Access).collect();
    assert_eq!(access.len(), 2);
    assert_eq!(access[0].details.as_deref(), Some(format!("CLAIMED: {}", id).as_str()));
    assert_eq!(
        access[1].details.as_deref(),
        Some(format!("REVIEWED: {} approved", id).as_str())
    );
}

#[tokio::test]
async fn test_review_submitAfterDecision_shouldFailWithConflict() {
    let t = test_gateway();
    let id = hold(&t, "My SSN is 123-45-6789").await;

    t.gateway
        .reviews()
        .submit_review(&id, "nurse-7", ReviewDecision::Rejected, None, None)
        .await
        .unwrap();

    let again = t
        .gateway
        .reviews()
        .submit_review(&id, "nurse-8", ReviewDecision::Approved, None, None)
        .await;
    let err = again.unwrap_err();
    assert!(matches!(err, ReviewError::InvalidState { .. }));
    assert_eq!(GatewayError::from(err).status(), 409);

    let stored = t.gateway.reviews().get(&id).await.unwrap();
    assert_eq!(stored.status, ReviewStatus::Rejected);
    assert_eq!(stored.reviewer_id.as_deref(), Some("nurse-7"));

    let escalate = t.gateway.reviews().escalate(&id, "too late", None).await;
    assert!(matches!(escalate, Err(ReviewError::InvalidState { .. })));

    t.gateway.audit().flush().await;
    let failures = t.repo.audit_events_for_session(&id).await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].result, AuditResult::Failure);
}

#[tokio::test]
async fn test_review_escalatePending_shouldRaisePriorityNotifyAndKeepStatus() {
    let t = test_gateway();
    let id = hold(&t, "Call me at 555-123-4567").await;
    let before = t.gateway.reviews().get(&id).await.unwrap();
    assert_ne!(before.priority, Priority::Critical);
    let alerts_before = t.notifier.alerts().len();

    let outcome = t
        .gateway
        .reviews()
        .escalate(&id, "patient deteriorating", Some("+1 555 0100".to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.review.priority, Priority::Critical);
    assert_eq!(outcome.review.status, ReviewStatus::Pending);
    assert_eq!(outcome.review.escalation_reason.as_deref(), Some("patient deteriorating"));
    assert_eq!(outcome.notifications_sent, 1);

    let alerts = t.notifier.alerts();
    assert_eq!(alerts.len(), alerts_before + 1);
    assert_eq!(alerts.last().unwrap().subject, ESCALATION_SUBJECT);
    assert_eq!(alerts.last().unwrap().priority, Priority::Critical);

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session(&before.session_id).await.unwrap();
    assert!(events.iter().any(|e| e.event_type == AuditEventType::Emergency
        && e.details.as_deref() == Some("ESCALATED: patient deteriorating")));
}

#[tokio::test]
async fn test_review_escalateRacingSubmit_shouldNeverReopenDecidedReview() {
    let t = test_gateway();
    let id = hold(&t, "Call me at 555-123-4567").await;
    let reviews = t.gateway.reviews();

    let (submitted, escalated) = tokio::join!(
        reviews.submit_review(&id, "nurse-7", ReviewDecision::Approved, None, Some("Llámeme".to_string())),
        reviews.escalate(&id, "no answer from reviewer", None),
    );
    submitted.unwrap();
    if let Err(e) = escalated {
        assert!(matches!(e, ReviewError::InvalidState { .. }));
    }

    let stored = reviews.get(&id).await.unwrap();
    assert_eq!(stored.status, ReviewStatus::Approved);
    assert_eq!(stored.reviewer_id.as_deref(), Some("nurse-7"));
    assert_eq!(stored.final_text.as_deref(), Some("Llámeme"));

    let late = reviews.escalate(&id, "still waiting", None).await;
    assert!(matches!(late, Err(ReviewError::InvalidState { .. })));
    assert_eq!(reviews.get(&id).await.unwrap().status, ReviewStatus::Approved);
}

#[tokio::test]
async fn test_review_unknownId_shouldBeNotFound() {
    let t = test_gateway();

    let err = t
        .gateway
        .reviews()
        .submit_review("rev-404", "nurse-7", ReviewDecision::Approved, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotFound(_)));
    assert_eq!(GatewayError::from(err).status(), 404);

    assert!(matches!(
        t.gateway.reviews().escalate("rev-404", "why", None).await,
        Err(ReviewError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_review_listPending_shouldOrderAndFilter() {
    let t = TestGatewayBuilder::new()
        .both(MockTranslator::working().with_custom_response(add_fever))
        .build();

    let phone = hold(&t, "Call me at 555-123-4567").await;
    t.clock.advance(Duration::minutes(1));
    let ssn = hold(&t, "My SSN is 123-45-6789").await;
    t.clock.advance(Duration::minutes(1));
    let emergency = hold(&t, "Severe crushing chest pain radiating to left arm").await;

    let queue = t.gateway.reviews().list_pending(None, false).await.unwrap();
    let ids: Vec<&str> = queue.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![emergency.as_str(), ssn.as_str(), phone.as_str()]);

    let urgent = t.gateway.reviews().list_pending(None, true).await.unwrap();
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].id, emergency);

    let high = t.gateway.reviews().list_pending(Some(Priority::High), false).await.unwrap();
    assert!(high.iter().all(|r| r.priority == Priority::High));

    t.gateway
        .reviews()
        .submit_review(&emergency, "dr-1", ReviewDecision::RequiresRevision, None, None)
        .await
        .unwrap();
    let remaining = t.gateway.reviews().list_pending(None, false).await.unwrap();
    assert_eq!(remaining.len(), 2);
}

#[tokio::test]
async fn test_review_metrics_shouldSummarizeQueue() {
    let t = test_gateway();
    let first = hold(&t, "My SSN is 123-45-6789").await;
    hold(&t, "Call me at 555-123-4567").await;

    t.clock.advance(Duration::minutes(10));
    t.gateway
        .reviews()
        .submit_review(&first, "nurse-7", ReviewDecision::Approved, None, None)
        .await
        .unwrap();

    let metrics = t.gateway.reviews().metrics("24h").await.unwrap();
    assert_eq!(metrics.timeframe, "24h");
    assert_eq!(metrics.total, 2);
    assert_eq!(metrics.pending, 1);
    assert_eq!(metrics.approved, 1);
    assert!((metrics.average_review_seconds - 600.0).abs() < 1e-6);
    assert_eq!(metrics.top_issues.len(), 2);
    assert!(metrics.top_issues.iter().all(|i| i.count == 1));

    let bad = t.gateway.reviews().metrics("forever").await;
    assert!(matches!(bad, Err(ReviewError::Validation(_))));
}
