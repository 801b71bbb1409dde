/*!
 * End-to-end tests of the translation gateway with scripted engines.
 */

use std::sync::Arc;

use lifebridge::app_config::Config;
use lifebridge::audit::{AuditEventType, AuditResult};
use lifebridge::errors::{GatewayError, ValidationError};
use lifebridge::gateway::{GatewayRequest, GatewayResponse};
use lifebridge::models::{MedicalContext, Priority};
use lifebridge::phi::RiskLevel;
use lifebridge::providers::TranslatorRequest;
use lifebridge::providers::mock::MockTranslator;
use lifebridge::review::ReviewStatus;

use crate::common::{FailingReviewStore, TestGatewayBuilder, test_gateway};

fn add_fever(request: &TranslatorRequest) -> String {
    format!("{} with fever", request.text)
}

#[tokio::test]
async fn test_translate_withRoutineConsultation_shouldDeliverAndAudit() {
    let t = test_gateway();

    let response = t
        .gateway
        .translate(GatewayRequest::new("I have a headache", "en", "es"))
        .await
        .unwrap();

    let delivered = match response {
        GatewayResponse::Delivered(d) => d,
        other => panic!("expected delivery, got {:?}", other),
    };
    assert_eq!(delivered.session_id, "session-1");
    assert_eq!(delivered.translated_text, "[es] I have a headache");
    assert_eq!(delivered.method, "fast-mock");
    assert_eq!(delivered.context, MedicalContext::Consultation);
    assert!(delivered.medical_analysis.contains_medical);
    assert!(!delivered.medical_analysis.is_emergency);
    assert!(delivered.medical_analysis.detected_terms.contains(&"headache".to_string()));
    assert_eq!(delivered.phi_compliance.detected_count, 0);
    assert_eq!(delivered.phi_compliance.risk_level, RiskLevel::Low);
    assert!(delivered.quality_score >= 0.7);
    assert!(delivered.fallback_reason.is_none());

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session("session-1").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, AuditEventType::Translation);
    assert_eq!(events[0].result, AuditResult::Success);
    assert_eq!(events[0].human_review_required, Some(false));
    assert_eq!(events[0].phi_detected, Some(false));
    assert_eq!(events[0].text_length, Some(17));
}

#[tokio::test]
async fn test_translate_withSsn_shouldHoldRedactedTextForReview() {
    let t = test_gateway();

    let response = t
        .gateway
        .translate(GatewayRequest::new("My SSN is 123-45-6789", "en", "es"))
        .await
        .unwrap();

    let pending = match response {
        GatewayResponse::PendingReview(p) => p,
        other => panic!("expected a pending review, got {:?}", other),
    };
    assert_eq!(pending.priority, Priority::High);
    assert_eq!(pending.estimated_review_time, "5-10 minutes");
    assert!(pending.translated_text.is_none());
    assert!(pending.quality_score.is_none());

    let review = t.gateway.reviews().get(&pending.review_id).await.unwrap();
    assert_eq!(review.status, ReviewStatus::Pending);
    assert!(!review.original_text.contains("6789"));
    assert!(!review.candidate_text.contains("6789"));
    assert!(review.original_text.contains("[SSN-REDACTED]"));
    assert!(review
        .flagged_issues
        .contains(&"Sensitive data requires manual review (critical risk)".to_string()));

    let alerts = t.notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "HIGH Priority Translation Review Required");

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session(&pending.session_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].result, AuditResult::Partial);
    assert_eq!(events[0].phi_detected, Some(true));
    assert_eq!(events[0].human_review_required, Some(true));
    assert_eq!(events[0].details.as_deref(), Some("REDACTED: [SSN-REDACTED]x1"));
}

#[tokio::test]
async fn test_translate_withEmergencySymptoms_shouldForceEmergencyContextAndHold() {
    let t = test_gateway();

    let request = GatewayRequest::new("Severe crushing chest pain radiating to left arm", "en", "es")
        .context(MedicalContext::General);
    let response = t.gateway.translate(request).await.unwrap();

    let pending = match response {
        GatewayResponse::PendingReview(p) => p,
        other => panic!("expected a pending review, got {:?}", other),
    };
    assert_eq!(pending.priority, Priority::High);
    assert_eq!(pending.estimated_review_time, "30 seconds");

    let review = t.gateway.reviews().get(&pending.review_id).await.unwrap();
    assert_eq!(review.context, MedicalContext::Emergency);
    assert!(review.is_emergency());

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session(&pending.session_id).await.unwrap();
    assert_eq!(events[0].emergency, Some(true));
}

#[tokio::test]
async fn test_translate_withEmergencyHallucination_shouldHoldAtCriticalPriority() {
    let t = TestGatewayBuilder::new()
        .both(MockTranslator::working().with_custom_response(add_fever))
        .build();

    let response = t
        .gateway
        .translate(GatewayRequest::new("Severe crushing chest pain radiating to left arm", "en", "es"))
        .await
        .unwrap();

    let pending = match response {
        GatewayResponse::PendingReview(p) => p,
        other => panic!("expected a pending review, got {:?}", other),
    };
    assert_eq!(pending.priority, Priority::Critical);

    let review = t.gateway.reviews().get(&pending.review_id).await.unwrap();
    assert!(review.flagged_issues.iter().any(|i| i.starts_with("Hallucination risk")));
    assert_eq!(t.notifier.alerts()[0].subject, "CRITICAL Priority Translation Review Required");
}

#[tokio::test]
async fn test_translate_withAllEnginesFailing_shouldFallBackToSourceText() {
    let t = TestGatewayBuilder::new()
        .fast(MockTranslator::failing())
        .reasoning(MockTranslator::failing())
        .build();

    let response = t
        .gateway
        .translate(GatewayRequest::new("I feel dizzy", "en", "es"))
        .await
        .unwrap();

    let delivered = match response {
        GatewayResponse::Delivered(d) => d,
        other => panic!("expected delivery, got {:?}", other),
    };
    assert_eq!(delivered.translated_text, "I feel dizzy");
    assert_eq!(delivered.method, "fallback");
    assert_eq!(delivered.confidence, 0.0);
    assert!(delivered
        .fallback_reason
        .as_deref()
        .is_some_and(|r| r.starts_with("All translation engines failed")));
    assert_eq!(t.fast.calls(), 1);
    assert_eq!(t.reasoning.calls(), 1);

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session("session-1").await.unwrap();
    assert_eq!(events[0].result, AuditResult::Failure);
    assert!(events[0].error_message.is_some());
}

#[tokio::test]
async fn test_translate_withSameLanguage_shouldPassThrough() {
    let t = test_gateway();

    let response = t
        .gateway
        .translate(GatewayRequest::new("I have a headache", "en", "en"))
        .await
        .unwrap();

    match response {
        GatewayResponse::Delivered(d) => {
            assert_eq!(d.method, "passthrough");
            assert_eq!(d.confidence, 1.0);
            assert_eq!(d.translated_text, "I have a headache");
        }
        other => panic!("expected delivery, got {:?}", other),
    }
    assert_eq!(t.fast.calls(), 0);
    assert_eq!(t.reasoning.calls(), 0);
}

#[tokio::test]
async fn test_translate_withMedicationContext_shouldUseReasoningEngine() {
    let t = test_gateway();

    let request =
        GatewayRequest::new("take 500 mg of amoxicillin twice daily", "en", "es").context(MedicalContext::Medication);
    let response = t.gateway.translate(request).await.unwrap();

    match response {
        GatewayResponse::Delivered(d) => assert_eq!(d.method, "reasoning-mock"),
        other => panic!("expected delivery, got {:?}", other),
    }
    assert_eq!(t.fast.calls(), 0);
}

#[tokio::test]
async fn test_translate_withInvalidInput_shouldRejectWithoutSideEffects() {
    let t = test_gateway();

    let empty = t.gateway.translate(GatewayRequest::new("   ", "en", "es")).await;
    match empty {
        Err(e @ GatewayError::Validation(ValidationError::EmptyText)) => assert_eq!(e.status(), 400),
        other => panic!("expected EmptyText, got {:?}", other),
    }

    let too_long = t.gateway.translate(GatewayRequest::new("a".repeat(5001), "en", "es")).await;
    assert!(matches!(
        too_long,
        Err(GatewayError::Validation(ValidationError::TextTooLong { max: 5000, actual: 5001 }))
    ));

    let bad_language = t.gateway.translate(GatewayRequest::new("hello", "en", "zz-none")).await;
    assert!(matches!(
        bad_language,
        Err(GatewayError::Validation(ValidationError::InvalidLanguage(_)))
    ));

    t.gateway.audit().flush().await;
    assert_eq!(t.repo.count_audit_events().await.unwrap(), 0);
    assert_eq!(t.fast.calls(), 0);
}

#[tokio::test]
async fn test_translate_withReviewStoreDown_shouldReportUnavailableAndAuditFailure() {
    let t = TestGatewayBuilder::new()
        .review_store(Arc::new(FailingReviewStore))
        .build();

    let result = t
        .gateway
        .translate(GatewayRequest::new("My SSN is 123-45-6789", "en", "es").session("outage-1"))
        .await;

    match result {
        Err(e @ GatewayError::ReviewUnavailable(_)) => assert_eq!(e.status(), 503),
        other => panic!("expected ReviewUnavailable, got {:?}", other),
    }

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session("outage-1").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].result, AuditResult::Failure);
    assert!(events[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("Review queue unavailable")));
}

#[tokio::test]
async fn test_translate_twice_withCacheEnabled_shouldCallEngineOnce() {
    let t = TestGatewayBuilder::new().with_cache().build();

    for _ in 0..2 {
        let response = t
            .gateway
            .translate(GatewayRequest::new("I have a headache", "en", "es"))
            .await
            .unwrap();
        assert!(!response.is_pending_review());
    }
    assert_eq!(t.fast.calls(), 1);
}

#[tokio::test]
async fn test_translate_withHeldCandidate_shouldNotCacheIt() {
    let t = TestGatewayBuilder::new()
        .both(MockTranslator::working().with_custom_response(add_fever))
        .with_cache()
        .build();

    for _ in 0..2 {
        let response = t
            .gateway
            .translate(GatewayRequest::new("I have a headache", "en", "es"))
            .await
            .unwrap();
        assert!(response.is_pending_review());
    }

    assert!(t.gateway.dispatcher().cache().is_empty());
    assert_eq!(t.fast.calls(), 2);
}

#[tokio::test]
async fn test_translate_withSharedCandidate_shouldExposeUnreviewedText() {
    let mut config = Config::default();
    config.gateway.share_unreviewed_candidate = true;
    let t = TestGatewayBuilder::new().config(config).build();

    let response = t
        .gateway
        .translate(GatewayRequest::new("My SSN is 123-45-6789", "en", "es"))
        .await
        .unwrap();

    match response {
        GatewayResponse::PendingReview(p) => {
            assert_eq!(p.translated_text.as_deref(), Some("[es] My SSN is [SSN-REDACTED]"));
            assert!(p.quality_score.is_some());
        }
        other => panic!("expected a pending review, got {:?}", other),
    }
}

#[tokio::test]
async fn test_translate_withUserId_shouldStoreOnlyPseudonym() {
    let t = test_gateway();

    t.gateway
        .translate(GatewayRequest::new("I have a headache", "en", "es").user("nurse-7").session("s-user"))
        .await
        .unwrap();

    t.gateway.audit().flush().await;
    let events = t.repo.audit_events_for_session("s-user").await.unwrap();
    let stored = events[0].user_id.clone().unwrap();
    assert_ne!(stored, "nurse-7");
    assert_eq!(stored.len(), 64);
}

#[tokio::test]
async fn test_translate_everyRequest_shouldEndInExactlyOneOutcome() {
    let t = test_gateway();
    let texts = [
        "I have a headache",
        "My SSN is 123-45-6789",
        "Severe crushing chest pain radiating to left arm",
        "Call me at 555-123-4567",
    ];

    let mut held = 0;
    for text in texts {
        if t.gateway.translate(GatewayRequest::new(text, "en", "es")).await.unwrap().is_pending_review() {
            held += 1;
        }
    }

    let open = t.gateway.reviews().list_pending(None, false).await.unwrap();
    assert_eq!(open.len(), held);
}
