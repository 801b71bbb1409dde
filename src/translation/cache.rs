/*!
 * Translation caching.
 *
 * Keeps delivered engine translations in memory so repeated utterances skip
 * the model call. Keys are built from already-redacted text only. Entries
 * expire after a fixed time to live.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::providers::TranslatorOutput;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// A cached engine answer
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTranslation {
    pub output: TranslatorOutput,
    /// Engine that produced the translation
    pub method: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedTranslation,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: usize,
    misses: usize,
}

/// In-memory translation cache with expiry
#[derive(Debug, Clone)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    counters: Arc<RwLock<CacheCounters>>,
    ttl: Duration,
    enabled: bool,
}

impl TranslationCache {
    pub fn new(enabled: bool, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(RwLock::new(CacheCounters::default())),
            ttl,
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    pub fn get(&self, text: &str, source_language: &str, target_language: &str) -> Option<CachedTranslation> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(text, source_language, target_language);
        let found = {
            let entries = self.entries.read();
            entries
                .get(&key)
                .filter(|entry| entry.stored_at.elapsed() < self.ttl)
                .map(|entry| entry.value.clone())
        };

        let mut counters = self.counters.write();
        match found {
            Some(value) => {
                counters.hits += 1;
                debug!("Cache hit ({} -> {})", source_language, target_language);
                Some(value)
            }
            None => {
                counters.misses += 1;
                debug!("Cache miss ({} -> {})", source_language, target_language);
                None
            }
        }
    }

    pub fn store(&self, text: &str, source_language: &str, target_language: &str, value: CachedTranslation) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(text, source_language, target_language);
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let counters = self.counters.read();
        let total = counters.hits + counters.misses;
        let hit_rate = if total > 0 {
            counters.hits as f64 / total as f64
        } else {
            0.0
        };
        (counters.hits, counters.misses, hit_rate)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        *self.counters.write() = CacheCounters::default();
        debug!("Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
