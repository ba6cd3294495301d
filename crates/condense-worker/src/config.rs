//! Worker configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent worker tasks sharing the queue consumer.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    /// Collaborator invocations allowed per job before it fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential retry backoff, in seconds.
    #[serde(default = "default_retry_base_secs")]
    pub retry_base_secs: u64,
    /// Hard bound on a single collaborator call, in seconds. Exceeding it
    /// counts as a transient failure.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    /// TTL for cached results, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_concurrency() -> u32 {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_secs() -> u64 {
    1
}

fn default_task_timeout_secs() -> u64 {
    300
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            retry_base_secs: default_retry_base_secs(),
            task_timeout_secs: default_task_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl WorkerConfig {
    pub fn retry_base(&self) -> Duration {
        Duration::from_secs(self.retry_base_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
