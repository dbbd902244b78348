//! Query normalization and cache-key hashing.

use sha2::{Digest, Sha256};

/// Normalizes a query string for cache lookup: trims outer whitespace,
/// collapses inner whitespace runs to a single space, and case folds.
pub fn normalize(query: &str) -> String {
    query.trim().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Hex-encoded SHA-256 of the normalized query, used as a disk-cache file
/// name. Collisions are not a correctness concern here (a wrong hit would
/// just be indistinguishable staleness), only a sizing one, so a fast
/// general-purpose hash is enough.
pub fn hash_key(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}
