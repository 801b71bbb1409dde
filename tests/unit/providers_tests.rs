/*!
 * Tests for translator engines and the dispatcher that drives them
 */

use std::sync::Arc;
use std::time::Duration;

use lifebridge::models::MedicalContext;
use lifebridge::providers::mock::MockTranslator;
use lifebridge::providers::phrasebook::{PHRASEBOOK_CONFIDENCE, PhrasebookTranslator};
use lifebridge::providers::{Translator, TranslatorRequest};
use lifebridge::routing::{RouteDecision, Strategy};
use lifebridge::translation::{Dispatcher, TranslationCache};

const TIMEOUT: Duration = Duration::from_millis(500);

fn request(text: &str) -> TranslatorRequest {
    TranslatorRequest {
        text: text.to_string(),
        source_language: "en".to_string(),
        target_language: "es".to_string(),
        context: MedicalContext::Emergency,
    }
}

fn fast_route() -> RouteDecision {
    RouteDecision::Translate {
        strategy: Strategy::Fast,
        reason: "test".to_string(),
    }
}

#[test]
fn test_phrasebook_withKnownPhrase_shouldAnswerWithoutEngine() {
    let engine = MockTranslator::failing().named("fast-mock");
    let phrasebook = PhrasebookTranslator::new(Arc::new(engine.clone()));

    let (known, unknown) = tokio_test::block_on(async {
        (
            phrasebook.translate(&request("Call for help!")).await,
            phrasebook.translate(&request("Call for help, my father fell")).await,
        )
    });

    let output = known.unwrap();
    assert_eq!(output.translated_text, "¡Llame para pedir ayuda!");
    assert_eq!(output.confidence, PHRASEBOOK_CONFIDENCE);
    assert_eq!(phrasebook.name(), "phrasebook+fast-mock");

    assert!(unknown.is_err());
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn test_dispatch_withSlowPrimary_shouldTimeOutAndUseAlternate() {
    let fast = MockTranslator::slow(2_000).named("fast-mock");
    let reasoning = MockTranslator::working().named("reasoning-mock");
    let dispatcher = Dispatcher::new(Arc::new(fast), Arc::new(reasoning), TranslationCache::disabled());

    let outcome = dispatcher
        .dispatch(&request("I feel dizzy"), &fast_route(), Duration::from_millis(50))
        .await;

    assert_eq!(outcome.method, "reasoning-mock");
    assert_eq!(outcome.strategy, Some(Strategy::Reasoning));
    assert_eq!(outcome.translated_text, "[es] I feel dizzy");
    assert!(!outcome.is_fallback());
}

#[tokio::test]
async fn test_dispatch_withEmptyPrimaryAnswer_shouldUseAlternate() {
    let dispatcher = Dispatcher::new(
        Arc::new(MockTranslator::empty().named("fast-mock")),
        Arc::new(MockTranslator::working().named("reasoning-mock")),
        TranslationCache::disabled(),
    );

    let outcome = dispatcher.dispatch(&request("I feel dizzy"), &fast_route(), TIMEOUT).await;
    assert_eq!(outcome.method, "reasoning-mock");
}

#[tokio::test]
async fn test_dispatch_withEveryEngineDown_shouldReturnSourceAsFallback() {
    let dispatcher = Dispatcher::new(
        Arc::new(MockTranslator::failing()),
        Arc::new(MockTranslator::failing()),
        TranslationCache::disabled(),
    );

    let outcome = dispatcher.dispatch(&request("I feel dizzy"), &fast_route(), TIMEOUT).await;
    assert!(outcome.is_fallback());
    assert_eq!(outcome.translated_text, "I feel dizzy");
    assert_eq!(outcome.confidence, 0.0);
    assert_eq!(outcome.method, "fallback");
    let reason = outcome.fallback_reason.unwrap();
    assert!(reason.starts_with("All translation engines failed ("));
    assert!(reason.contains("fast engine:"));
    assert!(reason.contains("reasoning engine:"));
}

#[tokio::test]
async fn test_dispatch_withRememberedTranslation_shouldServeRepeatsFromCache() {
    let fast = MockTranslator::working().named("fast-mock");
    let dispatcher = Dispatcher::new(
        Arc::new(fast.clone()),
        Arc::new(MockTranslator::working()),
        TranslationCache::new(true, Duration::from_secs(60)),
    );

    let first = dispatcher.dispatch(&request("I feel dizzy"), &fast_route(), TIMEOUT).await;
    dispatcher.remember(&request("I feel dizzy"), &first);
    let second = dispatcher.dispatch(&request("I feel dizzy"), &fast_route(), TIMEOUT).await;

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.method, "fast-mock");
    assert_eq!(second.translated_text, first.translated_text);
    assert_eq!(fast.calls(), 1);
}
