use sha2::{Digest, Sha256};

/// Canonical form of a query used for cache keys and analytics grouping:
/// trimmed, lower-cased, inner whitespace collapsed to single spaces.
pub fn normalize_query(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Digest of a query's normalized form, used as the analytics record key.
pub fn query_hash(query: &str) -> String {
    sha256_hex(&normalize_query(query))
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
