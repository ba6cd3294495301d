//! Service configuration.

use condense_api::RateLimitConfig;
use condense_nats::NatsConfig;
use condense_summarizer::SummarizerConfig;
use condense_worker::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for both the API server and the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the API server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,
    /// KV bucket for cached summaries.
    #[serde(default = "default_cache_bucket")]
    pub cache_bucket: String,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub summarizer: SummarizerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSection {
    #[serde(default = "default_summarizer_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_cache_bucket() -> String {
    "CONDENSE_CACHE".to_string()
}

fn default_summarizer_url() -> String {
    "https://api.cohere.ai".to_string()
}

fn default_model() -> String {
    "summarize-xlarge".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for SummarizerSection {
    fn default() -> Self {
        Self {
            base_url: default_summarizer_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            nats_url: default_nats_url(),
            cache_bucket: default_cache_bucket(),
            rate_limit: RateLimitConfig::default(),
            worker: WorkerConfig::default(),
            summarizer: SummarizerSection::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a YAML file when given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&contents)?
            }
            None => Self::default(),
        };

        if let Ok(url) = std::env::var("CONDENSE_NATS_URL") {
            config.nats_url = url;
        }
        if let Ok(addr) = std::env::var("CONDENSE_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        Ok(config)
    }

    pub fn nats(&self) -> NatsConfig {
        // Redelivery must not fire while a collaborator call is legitimately
        // in flight.
        let ack_wait = Duration::from_secs(self.worker.task_timeout_secs + 30);
        NatsConfig::new(self.nats_url.clone()).with_ack_wait(ack_wait)
    }

    pub fn summarizer(&self) -> SummarizerConfig {
        SummarizerConfig {
            base_url: self.summarizer.base_url.clone(),
            api_key: std::env::var("CONDENSE_SUMMARIZER_API_KEY").unwrap_or_default(),
            model: self.summarizer.model.clone(),
            request_timeout: Duration::from_secs(self.summarizer.request_timeout_secs),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.worker.cache_ttl_secs)
    }
}
