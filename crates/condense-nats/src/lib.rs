//! NATS JetStream backends for Condense.
//!
//! One connection serves three concerns: a work-queue stream delivering job
//! ids to workers (at-least-once, explicit ack), a KV bucket holding job
//! records with revision-checked updates, and the KV bucket the cache crate
//! layers on top of.

mod config;
mod queue;
mod store;

pub use config::NatsConfig;
pub use queue::NatsJobQueue;
pub use store::KvJobStore;

use async_nats::jetstream;
use condense_core::{Error, Result};
use tracing::info;

/// A connected JetStream backend, from which the store and queue are built.
pub struct NatsBackend {
    client: async_nats::Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsBackend {
    /// Connect to NATS and initialize JetStream.
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let urls = config.urls.join(",");
        info!(urls = %urls, "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(config.connection_timeout)
            .request_timeout(Some(config.request_timeout))
            .connect(&urls)
            .await
            .map_err(|e| Error::BackendDegraded(format!("Failed to connect to NATS: {}", e)))?;

        let jetstream = jetstream::new(client.clone());

        Ok(Self {
            client,
            jetstream,
            config,
        })
    }

    /// Open the job store bucket.
    pub async fn job_store(&self) -> Result<KvJobStore> {
        KvJobStore::create(&self.jetstream, &self.config).await
    }

    /// Open the work queue stream and its pull consumer.
    pub async fn job_queue(&self) -> Result<NatsJobQueue> {
        NatsJobQueue::create(&self.jetstream, &self.config).await
    }

    /// The underlying JetStream context, for callers that build further
    /// buckets on the same connection (the content cache does).
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Server connection state.
    pub fn connection_state(&self) -> async_nats::connection::State {
        self.client.connection_state()
    }
}
