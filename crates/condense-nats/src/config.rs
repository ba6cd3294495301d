//! Configuration for the NATS backend.

use std::time::Duration;

/// Configuration for the JetStream job store and queue.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs (comma-separated for cluster).
    pub urls: Vec<String>,
    /// Work-queue stream name.
    pub stream_name: String,
    /// Subject jobs are published on.
    pub subject: String,
    /// Durable consumer name shared by the worker pool.
    pub consumer_name: String,
    /// KV bucket holding job records.
    pub jobs_bucket: String,
    /// Redelivery deadline for unacked deliveries. Must exceed the worker's
    /// collaborator timeout or in-flight jobs get redelivered mid-run.
    pub ack_wait: Duration,
    /// Connection timeout.
    pub connection_timeout: Duration,
    /// Request timeout for JetStream operations.
    pub request_timeout: Duration,
    /// Retention for job records and queued messages.
    pub max_age: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: vec!["nats://localhost:4222".to_string()],
            stream_name: "CONDENSE_JOBS".to_string(),
            subject: "jobs.summarize".to_string(),
            consumer_name: "condense-workers".to_string(),
            jobs_bucket: "CONDENSE_JOB_STATE".to_string(),
            ack_wait: Duration::from_secs(330),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
            max_age: Duration::from_secs(86400 * 7), // 7 days
        }
    }
}

impl NatsConfig {
    /// Create a new config with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            ..Default::default()
        }
    }

    /// Set multiple server URLs for cluster support.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Set the work-queue stream name.
    pub fn with_stream_name(mut self, name: impl Into<String>) -> Self {
        self.stream_name = name.into();
        self
    }

    /// Set the ack deadline for in-flight deliveries.
    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    /// Set the retention period for job records and queued messages.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}
