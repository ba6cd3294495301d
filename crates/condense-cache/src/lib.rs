//! Content-addressed summary cache.
//!
//! Two [`ContentCache`](condense_core::ports::ContentCache) implementations:
//! [`KvCache`] backed by a NATS JetStream key-value bucket, and
//! [`MemoryCache`], the in-process fallback used when the backend is
//! unreachable at startup. The fallback keeps the API responsive but holds
//! no persistence guarantee; bootstrap logs loudly when it is selected and
//! health reports the active backend.

mod kv;
mod memory;

pub use kv::KvCache;
pub use memory::MemoryCache;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored envelope: the cached value plus its absolute expiry.
///
/// Expiry is enforced on read so both backends share the same TTL
/// semantics; the KV bucket's max_age only bounds physical retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CacheEnvelope {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEnvelope {
    pub(crate) fn new(value: &str, ttl: std::time::Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Utc::now()
                + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()),
        }
    }

    pub(crate) fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
