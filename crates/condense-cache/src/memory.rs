//! In-process fallback cache.

use crate::CacheEnvelope;
use async_trait::async_trait;
use condense_core::fingerprint;
use condense_core::ports::ContentCache;
use condense_core::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Ephemeral map standing in for the durable backend during degraded
/// operation. Entries honor the same TTL semantics as [`crate::KvCache`]
/// but vanish with the process.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEnvelope>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(envelope) if envelope.is_expired() => {
                entries.remove(key);
                None
            }
            Some(envelope) => Some(envelope.value.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl ContentCache for MemoryCache {
    async fn get(&self, text: &str) -> Option<String> {
        self.lookup(&fingerprint::cache_key(text))
    }

    async fn get_by_fingerprint(&self, fp: &str) -> Option<String> {
        self.lookup(&fingerprint::cache_key_for(fp))
    }

    async fn set(&self, text: &str, value: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(fingerprint::cache_key(text), CacheEnvelope::new(value, ttl));
        true
    }

    async fn invalidate(&self, text: &str) -> bool {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(&fingerprint::cache_key(text)).is_some()
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
