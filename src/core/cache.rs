//! Response cache for translate and dictionary lookups
//!
//! Process-wide and shared across identities: the translation of "hello"
//! does not depend on who asks. Entries are keyed by the canonical request
//! fingerprint and never updated in place.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::models::{TranslateMode, TranslateOutcome};

/// Deterministic cache key for a canonical request
///
/// Colon-joined lowercase fields; identical canonical inputs for the same
/// `(mode, source, target)` triple always collide.
pub fn cache_key(mode: TranslateMode, source_lang: &str, target_lang: &str, canonical: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        mode,
        source_lang.to_lowercase(),
        target_lang.to_lowercase(),
        canonical
    )
}

/// Storage for computed translate outcomes
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Stored outcome for `key`, if any
    async fn get(&self, key: &str) -> Option<TranslateOutcome>;

    /// Store `outcome` under `key`; last writer wins on concurrent misses
    async fn put(&self, key: &str, outcome: TranslateOutcome);
}

/// In-memory cache for single-instance deployments
///
/// Unbounded: there is no TTL or eviction, matching the service's observed
/// lifetime behavior. Swap in a bounded [`ResultCache`] implementation for
/// memory-constrained or multi-instance deployments.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultCache {
    entries: Arc<RwLock<HashMap<String, TranslateOutcome>>>,
}

impl MemoryResultCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, key: &str) -> Option<TranslateOutcome> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, outcome: TranslateOutcome) {
        self.entries.write().await.insert(key.to_string(), outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TranslationEntry;

    fn outcome(text: &str) -> TranslateOutcome {
        TranslateOutcome::Translation(TranslationEntry {
            translation: text.to_string(),
            transliteration: None,
            pronunciation: None,
            notes: None,
        })
    }

    #[test]
    fn test_cache_key_shape() {
        let key = cache_key(TranslateMode::Translate, "auto", "darija", "hello");
        assert_eq!(key, "translate:auto:darija:hello");
    }

    #[test]
    fn test_cache_key_lowercases_langs() {
        let a = cache_key(TranslateMode::Dictionary, "EN", "Darija", "bousa");
        let b = cache_key(TranslateMode::Dictionary, "en", "darija", "bousa");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_mode_distinct() {
        let a = cache_key(TranslateMode::Translate, "en", "darija", "bousa");
        let b = cache_key(TranslateMode::Dictionary, "en", "darija", "bousa");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_get_put() {
        let cache = MemoryResultCache::new();
        assert!(cache.get("k").await.is_none());

        cache.put("k", outcome("salam")).await;
        assert_eq!(cache.get("k").await, Some(outcome("salam")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_last_writer_wins() {
        let cache = MemoryResultCache::new();
        cache.put("k", outcome("first")).await;
        cache.put("k", outcome("second")).await;
        assert_eq!(cache.get("k").await, Some(outcome("second")));
        assert_eq!(cache.len().await, 1);
    }
}
