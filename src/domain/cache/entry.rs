//! Response cache entry and statistics types

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Current wall-clock time as milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A cached response entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The normalized query text this entry was stored under
    query: String,
    /// The cached response payload (JSON serialized)
    payload: String,
    /// Embedding of the query, when semantic matching is available
    embedding: Option<Vec<f32>>,
    /// When this entry was created (epoch millis)
    created_at: u64,
    /// When this entry expires (epoch millis)
    expires_at: u64,
    /// Number of times this entry has been served
    hit_count: u64,
}

impl CacheEntry {
    /// Create a new entry expiring `ttl` from now
    pub fn new(query: impl Into<String>, payload: impl Into<String>, ttl: Duration) -> Self {
        let now = now_millis();

        Self {
            query: query.into(),
            payload: payload.into(),
            embedding: None,
            created_at: now,
            expires_at: now + ttl.as_millis() as u64,
            hit_count: 0,
        }
    }

    /// Attach an embedding for semantic matching
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Get the normalized query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Get the cached payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Get the embedding, if one was stored
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Get creation timestamp (epoch millis)
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Get expiration timestamp (epoch millis)
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Get hit count
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Check whether the entry is expired at the given time
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Record that this entry was served
    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of live entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Hits answered by similarity rather than exact key
    pub semantic_hits: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
    /// Whether semantic matching is enabled
    pub semantic_enabled: bool,
}

impl CacheStats {
    /// Build a snapshot, deriving the hit rate from the counters
    pub fn new(
        size: usize,
        max_size: usize,
        hits: u64,
        misses: u64,
        semantic_hits: u64,
        semantic_enabled: bool,
    ) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        Self {
            size,
            max_size,
            hits,
            misses,
            semantic_hits,
            hit_rate,
            semantic_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("hello world", r#"{"answer":"hi"}"#, Duration::from_secs(60));

        assert_eq!(entry.query(), "hello world");
        assert_eq!(entry.payload(), r#"{"answer":"hi"}"#);
        assert!(entry.embedding().is_none());
        assert_eq!(entry.hit_count(), 0);
        assert!(!entry.is_expired(now_millis()));
    }

    #[test]
    fn test_entry_expiry() {
        let entry = CacheEntry::new("query", "value", Duration::from_millis(50));

        assert!(!entry.is_expired(entry.created_at()));
        assert!(entry.is_expired(entry.created_at() + 51));
    }

    #[test]
    fn test_entry_with_embedding() {
        let entry = CacheEntry::new("query", "value", Duration::from_secs(60))
            .with_embedding(vec![0.1, 0.2, 0.3]);

        assert_eq!(entry.embedding(), Some(&[0.1, 0.2, 0.3][..]));
    }

    #[test]
    fn test_record_hit() {
        let mut entry = CacheEntry::new("query", "value", Duration::from_secs(60));

        entry.record_hit();
        entry.record_hit();

        assert_eq!(entry.hit_count(), 2);
    }

    #[test]
    fn test_stats_hit_rate() {
        let stats = CacheStats::new(10, 100, 80, 20, 5, true);

        assert!((stats.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(stats.semantic_hits, 5);
    }

    #[test]
    fn test_stats_hit_rate_no_lookups() {
        let stats = CacheStats::new(0, 100, 0, 0, 0, false);

        assert_eq!(stats.hit_rate, 0.0);
    }
}
