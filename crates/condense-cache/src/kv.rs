//! JetStream key-value backed cache.

use crate::CacheEnvelope;
use async_nats::jetstream;
use async_nats::jetstream::kv;
use async_trait::async_trait;
use condense_core::fingerprint;
use condense_core::ports::ContentCache;
use condense_core::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Durable content cache on a JetStream KV bucket.
///
/// Values carry their own expiry (checked on read); the bucket's `max_age`
/// bounds how long expired entries can linger physically.
pub struct KvCache {
    store: kv::Store,
}

impl KvCache {
    /// Open (or create) the cache bucket on an existing JetStream context.
    pub async fn create(
        jetstream: &jetstream::Context,
        bucket: &str,
        max_age: Duration,
    ) -> Result<Self> {
        let store = jetstream
            .create_key_value(kv::Config {
                bucket: bucket.to_string(),
                max_age,
                ..Default::default()
            })
            .await
            .map_err(|e| {
                Error::BackendDegraded(format!("Failed to open cache bucket {}: {}", bucket, e))
            })?;

        Ok(Self { store })
    }

    // KV keys cannot contain ':', so the namespace separator is folded.
    fn kv_key(cache_key: &str) -> String {
        cache_key.replace(':', ".")
    }

    async fn lookup(&self, cache_key: &str) -> Option<String> {
        let key = Self::kv_key(cache_key);
        let entry = match self.store.get(key.as_str()).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                return None;
            }
        };

        let bytes = entry?;
        let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cache entry; treating as miss");
                return None;
            }
        };

        if envelope.is_expired() {
            debug!(key = %key, "Cache entry expired");
            if let Err(e) = self.store.delete(key.as_str()).await {
                debug!(key = %key, error = %e, "Failed to drop expired entry");
            }
            return None;
        }

        Some(envelope.value)
    }
}

#[async_trait]
impl ContentCache for KvCache {
    async fn get(&self, text: &str) -> Option<String> {
        self.lookup(&fingerprint::cache_key(text)).await
    }

    async fn get_by_fingerprint(&self, fp: &str) -> Option<String> {
        self.lookup(&fingerprint::cache_key_for(fp)).await
    }

    async fn set(&self, text: &str, value: &str, ttl: Duration) -> bool {
        let key = Self::kv_key(&fingerprint::cache_key(text));
        let envelope = CacheEnvelope::new(value, ttl);
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode cache entry");
                return false;
            }
        };

        match self.store.put(key.as_str(), payload.into()).await {
            Ok(_) => {
                debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached summary");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                false
            }
        }
    }

    async fn invalidate(&self, text: &str) -> bool {
        let key = Self::kv_key(&fingerprint::cache_key(text));
        match self.store.delete(key.as_str()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache invalidation failed");
                false
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        self.store
            .status()
            .await
            .map(|_| ())
            .map_err(|e| Error::BackendDegraded(format!("Cache bucket unavailable: {}", e)))
    }

    fn backend(&self) -> &'static str {
        "jetstream-kv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_key_folds_namespace_separator() {
        assert_eq!(
            KvCache::kv_key("summary:abc123"),
            "summary.abc123".to_string()
        );
    }
}
