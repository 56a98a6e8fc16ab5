//! Cache infrastructure

mod response_cache;

pub use response_cache::ResponseCache;
