//! Two-tier response cache
//!
//! Exact lookups hash the normalized query; when an embedding provider is
//! wired in, misses fall through to a cosine-similarity scan over entries
//! that carry embeddings. Expired entries are swept opportunistically on
//! reads and writes, and writes at capacity evict the least-used tenth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::cache::{
    CacheEntry, CacheStats, ResponseCacheConfig, cache_key, normalize_query, now_millis,
};
use crate::domain::embedding::{EmbeddingProvider, cosine_similarity};
use crate::domain::error::GatewayError;

/// In-process response cache with an optional semantic tier
#[derive(Debug)]
pub struct ResponseCache {
    config: ResponseCacheConfig,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    semantic_hits: AtomicU64,
}

impl ResponseCache {
    /// Create a cache with the given configuration
    pub fn new(config: ResponseCacheConfig) -> Self {
        Self {
            config,
            embeddings: None,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            semantic_hits: AtomicU64::new(0),
        }
    }

    /// Wire in the embedding collaborator for the semantic tier
    pub fn with_embeddings(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(provider);
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, CacheEntry>>, GatewayError> {
        self.entries
            .read()
            .map_err(|e| GatewayError::cache(format!("Cache lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, CacheEntry>>, GatewayError> {
        self.entries
            .write()
            .map_err(|e| GatewayError::cache(format!("Cache lock poisoned: {}", e)))
    }

    /// Look up a cached response, exact tier first, then semantic
    pub async fn get(&self, query: &str) -> Result<Option<String>, GatewayError> {
        let key = cache_key(query);
        let now = now_millis();

        {
            let mut entries = self.write()?;
            Self::sweep_expired(&mut entries, now);

            if let Some(entry) = entries.get_mut(&key) {
                entry.record_hit();
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit (exact)");
                return Ok(Some(entry.payload().to_string()));
            }
        }

        if self.config.semantic_enabled {
            if let Some(payload) = self.semantic_lookup(query).await? {
                return Ok(Some(payload));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    /// Similarity scan over entries that carry embeddings
    ///
    /// Embedding failures are logged and treated as a miss so the exact
    /// tier keeps working without the collaborator.
    async fn semantic_lookup(&self, query: &str) -> Result<Option<String>, GatewayError> {
        let Some(provider) = &self.embeddings else {
            return Ok(None);
        };

        let query_embedding = match provider.embed(&normalize_query(query)).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!(error = %err, "Embedding lookup failed, exact tier only");
                return Ok(None);
            }
        };

        let mut entries = self.write()?;

        let mut best: Option<(String, f32)> = None;
        for (key, entry) in entries.iter() {
            if let Some(embedding) = entry.embedding() {
                let score = cosine_similarity(&query_embedding, embedding);
                if best.as_ref().is_none_or(|(_, top)| score > *top) {
                    best = Some((key.clone(), score));
                }
            }
        }

        if let Some((key, score)) = best
            && score >= self.config.similarity_threshold
            && let Some(entry) = entries.get_mut(&key)
        {
            entry.record_hit();
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.semantic_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, similarity = score, "Cache hit (semantic)");
            return Ok(Some(entry.payload().to_string()));
        }

        Ok(None)
    }

    /// Store a response under the default TTL
    pub async fn set(
        &self,
        query: &str,
        payload: impl Into<String>,
    ) -> Result<(), GatewayError> {
        self.set_with_ttl(query, payload, self.config.ttl()).await
    }

    /// Store a response with an explicit TTL
    pub async fn set_with_ttl(
        &self,
        query: &str,
        payload: impl Into<String>,
        ttl: Duration,
    ) -> Result<(), GatewayError> {
        let key = cache_key(query);
        let normalized = normalize_query(query);

        // Embed before taking the lock; a failed embed stores an
        // exact-only entry.
        let embedding = match (&self.embeddings, self.config.semantic_enabled) {
            (Some(provider), true) => match provider.embed(&normalized).await {
                Ok(vector) => Some(vector),
                Err(err) => {
                    warn!(error = %err, "Embedding failed, storing exact-only entry");
                    None
                }
            },
            _ => None,
        };

        let mut entry = CacheEntry::new(normalized, payload, ttl);
        if let Some(vector) = embedding {
            entry = entry.with_embedding(vector);
        }

        let now = now_millis();
        let mut entries = self.write()?;
        Self::sweep_expired(&mut entries, now);
        Self::evict_if_full(&mut entries, self.config.max_size);
        entries.insert(key, entry);

        Ok(())
    }

    /// Drop the entry for a query, returning whether one existed
    pub fn invalidate(&self, query: &str) -> Result<bool, GatewayError> {
        let key = cache_key(query);
        let mut entries = self.write()?;
        Ok(entries.remove(&key).is_some())
    }

    /// Drop every entry
    pub fn clear(&self) -> Result<(), GatewayError> {
        let mut entries = self.write()?;
        entries.clear();
        info!("Response cache cleared");
        Ok(())
    }

    /// Snapshot the cache counters
    pub fn stats(&self) -> Result<CacheStats, GatewayError> {
        let entries = self.read()?;

        Ok(CacheStats::new(
            entries.len(),
            self.config.max_size,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.semantic_hits.load(Ordering::Relaxed),
            self.config.semantic_enabled,
        ))
    }

    fn sweep_expired(entries: &mut HashMap<String, CacheEntry>, now: u64) {
        entries.retain(|_, entry| !entry.is_expired(now));
    }

    /// At or above capacity, drop the bottom tenth (at least one entry)
    /// ranked by hit count, then age
    fn evict_if_full(entries: &mut HashMap<String, CacheEntry>, max_size: usize) {
        if entries.len() < max_size {
            return;
        }

        let mut ranked: Vec<(String, u64, u64)> = entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.hit_count(), entry.created_at()))
            .collect();
        ranked.sort_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));

        let to_remove = (ranked.len() / 10).max(1);
        for (key, _, _) in ranked.into_iter().take(to_remove) {
            entries.remove(&key);
        }

        debug!(evicted = to_remove, "Cache eviction");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbeddingProvider;

    fn cache(config: ResponseCacheConfig) -> ResponseCache {
        ResponseCache::new(config)
    }

    #[tokio::test]
    async fn test_set_then_get_returns_payload() {
        let cache = cache(ResponseCacheConfig::default());

        cache.set("what is your return policy?", "30 days").await.unwrap();
        let found = cache.get("what is your return policy?").await.unwrap();

        assert_eq!(found.as_deref(), Some("30 days"));
    }

    #[tokio::test]
    async fn test_unseen_query_misses() {
        let cache = cache(ResponseCacheConfig::default());

        assert!(cache.get("never stored").await.unwrap().is_none());

        let stats = cache.stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_lookup_is_normalized() {
        let cache = cache(ResponseCacheConfig::default());

        cache.set("How Do I Return?", "via the portal").await.unwrap();
        let found = cache.get("  how do i return?  ").await.unwrap();

        assert_eq!(found.as_deref(), Some("via the portal"));
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = cache(ResponseCacheConfig::default());

        cache
            .set_with_ttl("short lived", "gone soon", Duration::from_millis(40))
            .await
            .unwrap();
        assert!(cache.get("short lived").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(70)).await;

        assert!(cache.get("short lived").await.unwrap().is_none());
        assert_eq!(cache.stats().unwrap().size, 0);
    }

    #[tokio::test]
    async fn test_per_entry_ttl_is_honored() {
        let cache = cache(ResponseCacheConfig::default());

        cache
            .set_with_ttl("short", "a", Duration::from_millis(40))
            .await
            .unwrap();
        cache.set("long", "b").await.unwrap();

        tokio::time::sleep(Duration::from_millis(70)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_eviction_prefers_least_hit_entries() {
        let cache = cache(ResponseCacheConfig::new().with_max_size(5));

        for i in 0..5 {
            cache.set(&format!("query {}", i), "answer").await.unwrap();
        }
        // Touch everything except query 2
        for i in [0, 1, 3, 4] {
            cache.get(&format!("query {}", i)).await.unwrap();
        }

        cache.set("query 5", "answer").await.unwrap();

        assert!(cache.get("query 2").await.unwrap().is_none());
        assert!(cache.get("query 0").await.unwrap().is_some());
        assert!(cache.get("query 5").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_size_stays_within_capacity() {
        let cache = cache(ResponseCacheConfig::new().with_max_size(100));

        for i in 0..100 {
            cache.set(&format!("query {}", i), "answer").await.unwrap();
        }
        // Leave the first ten entries unhit
        for i in 10..100 {
            cache.get(&format!("query {}", i)).await.unwrap();
        }

        cache.set("query 100", "answer").await.unwrap();

        let stats = cache.stats().unwrap();
        assert!(stats.size <= 100);
        assert_eq!(stats.size, 91);

        for i in 0..10 {
            assert!(cache.get(&format!("query {}", i)).await.unwrap().is_none());
        }
        assert!(cache.get("query 100").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_semantic_hit_on_similar_query() {
        let provider = Arc::new(MockEmbeddingProvider::new(8).with_fixed_vector(vec![
            0.5, 0.1, 0.3, 0.2, 0.4, 0.1, 0.2, 0.3,
        ]));
        let cache = ResponseCache::new(
            ResponseCacheConfig::new()
                .with_semantic_enabled(true)
                .with_similarity_threshold(0.95),
        )
        .with_embeddings(provider);

        cache.set("what is the return window?", "30 days").await.unwrap();
        let found = cache.get("how long can I return items?").await.unwrap();

        assert_eq!(found.as_deref(), Some("30 days"));

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.semantic_hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_semantic_miss_below_threshold() {
        let provider = Arc::new(MockEmbeddingProvider::new(32));
        let cache = ResponseCache::new(
            ResponseCacheConfig::new()
                .with_semantic_enabled(true)
                .with_similarity_threshold(0.95),
        )
        .with_embeddings(provider);

        cache.set("what is the return window?", "30 days").await.unwrap();
        let found = cache.get("completely unrelated question").await.unwrap();

        assert!(found.is_none());
        assert_eq!(cache.stats().unwrap().semantic_hits, 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_exact_only() {
        let provider = Arc::new(MockEmbeddingProvider::new(8).with_error("quota exceeded"));
        let cache = ResponseCache::new(
            ResponseCacheConfig::new()
                .with_semantic_enabled(true)
                .with_similarity_threshold(0.9),
        )
        .with_embeddings(provider);

        cache.set("exact query", "answer").await.unwrap();

        assert_eq!(cache.get("exact query").await.unwrap().as_deref(), Some("answer"));
        assert!(cache.get("similar query").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = cache(ResponseCacheConfig::default());

        cache.set("to remove", "value").await.unwrap();

        assert!(cache.invalidate("to remove").unwrap());
        assert!(!cache.invalidate("to remove").unwrap());
        assert!(cache.get("to remove").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let cache = cache(ResponseCacheConfig::default());

        cache.set("a", "1").await.unwrap();
        cache.set("b", "2").await.unwrap();

        cache.clear().unwrap();

        assert_eq!(cache.stats().unwrap().size, 0);
        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hit_rate_reflects_counters() {
        let cache = cache(ResponseCacheConfig::default());

        cache.set("known", "value").await.unwrap();
        cache.get("known").await.unwrap();
        cache.get("known").await.unwrap();
        cache.get("unknown").await.unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-6);
    }
}
