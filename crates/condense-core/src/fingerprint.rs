//! Content fingerprinting and cache key derivation.

use sha2::{Digest, Sha256};

/// Namespace prefix for cache keys, so summary entries never collide with
/// unrelated data in a shared bucket.
const CACHE_NAMESPACE: &str = "summary:";

/// Prefix marking a task id as a resolved cache handle rather than a job id.
const HANDLE_PREFIX: &str = "cached_";

/// Deterministic fingerprint of the exact input text.
///
/// Keys on the text alone: requests with identical text but different
/// summarization parameters share one entry.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Namespaced cache key for the given text.
pub fn cache_key(text: &str) -> String {
    format!("{}{}", CACHE_NAMESPACE, fingerprint(text))
}

/// Namespaced cache key for an already-computed fingerprint.
pub fn cache_key_for(fp: &str) -> String {
    format!("{}{}", CACHE_NAMESPACE, fp)
}

/// Task id handed to clients when a request resolves directly from cache.
pub fn cache_handle(fp: &str) -> String {
    format!("{}{}", HANDLE_PREFIX, fp)
}

/// Extract the fingerprint from a cache-handle task id, if it is one.
pub fn parse_cache_handle(task_id: &str) -> Option<&str> {
    task_id.strip_prefix(HANDLE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("The quick brown fox.");
        let b = fingerprint("The quick brown fox.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_is_exact() {
        // No normalization: whitespace differences are distinct inputs.
        assert_ne!(fingerprint("fox"), fingerprint("fox "));
    }

    #[test]
    fn test_cache_key_namespaced() {
        let key = cache_key("fox");
        assert!(key.starts_with("summary:"));
        assert_eq!(key, cache_key_for(&fingerprint("fox")));
    }

    #[test]
    fn test_cache_handle_round_trip() {
        let fp = fingerprint("fox");
        let handle = cache_handle(&fp);
        assert_eq!(parse_cache_handle(&handle), Some(fp.as_str()));
        assert_eq!(parse_cache_handle("job_0192"), None);
    }
}
