//! Response cache domain types

mod config;
mod entry;
mod key;

pub use config::ResponseCacheConfig;
pub use entry::{CacheEntry, CacheStats, now_millis};
pub use key::{cache_key, normalize_query};
