//! Response cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the response cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCacheConfig {
    /// Maximum number of entries to store
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Time-to-live for cached entries in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Whether semantic (similarity-based) matching is enabled
    #[serde(default)]
    pub semantic_enabled: bool,

    /// Similarity threshold for semantic hits (0.0 to 1.0)
    /// Higher values require more similar queries
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

fn default_max_size() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_similarity_threshold() -> f32 {
    0.95
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            ttl_secs: default_ttl_secs(),
            semantic_enabled: false,
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl ResponseCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Set the maximum number of entries
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Enable or disable semantic matching
    pub fn with_semantic_enabled(mut self, enabled: bool) -> Self {
        self.semantic_enabled = enabled;
        self
    }

    /// Set the similarity threshold, clamped to [0.0, 1.0]
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}
