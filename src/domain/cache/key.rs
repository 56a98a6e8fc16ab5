//! Cache key derivation

use sha2::{Digest, Sha256};

/// Normalize a query for lookup: trim surrounding whitespace and casefold
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Derive the exact-match cache key for a query
///
/// The key is the first 16 hex characters of the SHA-256 digest of the
/// normalized query, so equivalent spellings land on the same entry.
pub fn cache_key(query: &str) -> String {
    let normalized = normalize_query(query);
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(digest)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_casefolds() {
        assert_eq!(normalize_query("  Hello World  "), "hello world");
        assert_eq!(normalize_query("HELLO"), "hello");
    }

    #[test]
    fn test_key_is_16_hex_chars() {
        let key = cache_key("what is your return policy?");

        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_equivalent_spellings_share_a_key() {
        assert_eq!(cache_key("How do I return?"), cache_key("  how do i return?  "));
        assert_ne!(cache_key("how do i return?"), cache_key("where is my order?"));
    }
}
