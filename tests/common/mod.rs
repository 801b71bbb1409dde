/*!
 * Common test utilities for the lifebridge test suite
 */

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

use lifebridge::app_config::Config;
use lifebridge::audit::AuditRecorder;
use lifebridge::clock::{FixedClock, SequentialIds};
use lifebridge::database::Repository;
use lifebridge::dictionaries::TermLibrary;
use lifebridge::errors::ReviewError;
use lifebridge::gateway::TranslationGateway;
use lifebridge::notification::{NotificationChannel, RecordingNotifier};
use lifebridge::providers::mock::MockTranslator;
use lifebridge::review::{ReviewRequest, ReviewStatus, ReviewStore, ReviewWorkflow};
use lifebridge::translation::{Dispatcher, TranslationCache};

/// Route crate logs to the test output when RUST_LOG is set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

/// Review store whose every call fails, for queue outage tests
#[derive(Debug, Default)]
pub struct FailingReviewStore;

#[async_trait]
impl ReviewStore for FailingReviewStore {
    async fn create(&self, _review: &ReviewRequest) -> Result<(), ReviewError> {
        Err(ReviewError::Store("review store offline".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Option<ReviewRequest>, ReviewError> {
        Err(ReviewError::Store("review store offline".to_string()))
    }

    async fn save(&self, _review: &ReviewRequest) -> Result<(), ReviewError> {
        Err(ReviewError::Store("review store offline".to_string()))
    }

    async fn list(&self, _statuses: &[ReviewStatus]) -> Result<Vec<ReviewRequest>, ReviewError> {
        Err(ReviewError::Store("review store offline".to_string()))
    }

    async fn list_since(&self, _since: DateTime<Utc>) -> Result<Vec<ReviewRequest>, ReviewError> {
        Err(ReviewError::Store("review store offline".to_string()))
    }
}

/// A gateway wired to in-memory collaborators plus handles to inspect them
pub struct TestGateway {
    pub gateway: TranslationGateway,
    pub repo: Repository,
    pub notifier: RecordingNotifier,
    pub clock: Arc<FixedClock>,
    pub fast: MockTranslator,
    pub reasoning: MockTranslator,
}

pub struct TestGatewayBuilder {
    config: Config,
    fast: MockTranslator,
    reasoning: MockTranslator,
    store: Option<Arc<dyn ReviewStore>>,
    cache: bool,
}

impl TestGatewayBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            fast: MockTranslator::working().named("fast-mock"),
            reasoning: MockTranslator::working().named("reasoning-mock"),
            store: None,
            cache: false,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn fast(mut self, translator: MockTranslator) -> Self {
        self.fast = translator;
        self
    }

    pub fn reasoning(mut self, translator: MockTranslator) -> Self {
        self.reasoning = translator;
        self
    }

    pub fn both(self, translator: MockTranslator) -> Self {
        self.fast(translator.clone()).reasoning(translator)
    }

    pub fn review_store(mut self, store: Arc<dyn ReviewStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cache(mut self) -> Self {
        self.cache = true;
        self
    }

    pub fn build(self) -> TestGateway {
        init_logging();
        let repo = Repository::new_in_memory().expect("in-memory database");
        let shared_repo = Arc::new(repo.clone());
        let clock = Arc::new(FixedClock::new(test_start()));
        let notifier = RecordingNotifier::new();
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(notifier.clone())];

        let audit = AuditRecorder::new(shared_repo.clone(), clock.clone(), Arc::new(SequentialIds::new("evt")));
        let store: Arc<dyn ReviewStore> = self.store.unwrap_or(shared_repo);
        let reviews = ReviewWorkflow::new(
            store,
            channels,
            audit.clone(),
            clock.clone(),
            Arc::new(SequentialIds::new("rev")),
        );

        let cache = if self.cache {
            TranslationCache::new(true, Duration::from_secs(3600))
        } else {
            TranslationCache::disabled()
        };
        let dispatcher = Dispatcher::new(Arc::new(self.fast.clone()), Arc::new(self.reasoning.clone()), cache);

        let gateway = TranslationGateway::new(
            &self.config,
            TermLibrary::builtin().shared(),
            dispatcher,
            reviews,
            audit,
            Arc::new(SequentialIds::new("session")),
        );

        TestGateway {
            gateway,
            repo,
            notifier,
            clock,
            fast: self.fast,
            reasoning: self.reasoning,
        }
    }
}

impl Default for TestGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway with working mock engines and default configuration
pub fn test_gateway() -> TestGateway {
    TestGatewayBuilder::new().build()
}
