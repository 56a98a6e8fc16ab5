//! Stable session bucketing for traffic allocation
//!
//! Ensures the same session always lands in the same bucket for a given
//! experiment, across restarts and across machines.

use sha2::{Digest, Sha256};

/// Number of discrete buckets sessions are mapped into
pub const BUCKET_RESOLUTION: u64 = 10_000;

/// Deterministic bucketer for experiment assignment
#[derive(Debug, Clone, Copy)]
pub struct SessionBucketer;

impl SessionBucketer {
    /// Map (experiment, session) to a bucket in [0.0, 1.0)
    ///
    /// Uses SHA-256 so assignments are identical across processes; the
    /// std hasher is randomly seeded per process and would reshuffle
    /// every assignment on restart.
    pub fn bucket(experiment: &str, session_id: &str) -> f64 {
        let digest = Sha256::digest(format!("{}:{}", experiment, session_id).as_bytes());

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let value = u64::from_be_bytes(prefix);

        (value % BUCKET_RESOLUTION) as f64 / BUCKET_RESOLUTION as f64
    }
}
