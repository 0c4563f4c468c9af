//! Deterministic query fingerprints.

use std::hash::Hasher;

use serde::Serialize;
use xxhash_rust::xxh64::Xxh64;

use crate::error::Result;

/// Computes the fingerprint identifying `query` for caching and statistics.
///
/// The digest is the xxh64 of the query's canonical JSON serialization,
/// rendered as 16 hex characters. Structurally different queries can still
/// collide within 64 bits; that risk is accepted rather than widening the key.
pub fn fingerprint<T: Serialize>(query: &T) -> Result<String> {
    let canonical = serde_json::to_vec(query)?;
    let mut hasher = Xxh64::new(0);
    hasher.write(&canonical);
    Ok(hex::encode(hasher.finish().to_be_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SearchQuery, SourceQuery};

    #[test]
    fn identical_queries_share_a_fingerprint() {
        let a = SourceQuery::Search(SearchQuery::new("graph embeddings"));
        let b = SourceQuery::Search(SearchQuery::new("graph embeddings"));
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn different_text_changes_the_fingerprint() {
        let a = SourceQuery::Search(SearchQuery::new("graph embeddings"));
        let b = SourceQuery::Search(SearchQuery::new("vector indexes"));
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn fingerprint_is_sixteen_hex_chars() {
        let hash = fingerprint(&SearchQuery::new("x")).unwrap();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
