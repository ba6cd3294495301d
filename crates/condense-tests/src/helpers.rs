//! Test helper functions and utilities.

use crate::memory::{MemoryJobQueue, MemoryJobStore, ScriptedSummarizer};
use condense_api::{AppState, RateLimitConfig, RateLimiter, create_router};
use condense_cache::MemoryCache;
use condense_core::ports::{ContentCache, JobQueue, JobStore, Summarizer};
use condense_worker::{Worker, WorkerConfig};
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared in-memory backends for one test.
pub struct TestHarness {
    pub store: Arc<MemoryJobStore>,
    pub queue: Arc<MemoryJobQueue>,
    pub cache: Arc<MemoryCache>,
    pub summarizer: Arc<ScriptedSummarizer>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_summarizer(ScriptedSummarizer::new())
    }

    pub fn with_summarizer(summarizer: ScriptedSummarizer) -> Self {
        Self {
            store: Arc::new(MemoryJobStore::new()),
            queue: Arc::new(MemoryJobQueue::new()),
            cache: Arc::new(MemoryCache::new()),
            summarizer: Arc::new(summarizer),
        }
    }

    /// Worker wired to this harness's backends. Tests usually run with a
    /// zero-second retry base so backoff does not slow them down.
    pub fn worker(&self, config: WorkerConfig) -> Worker {
        Worker::new(
            Arc::clone(&self.store) as Arc<dyn JobStore>,
            Arc::clone(&self.queue) as Arc<dyn JobQueue>,
            Arc::clone(&self.cache) as Arc<dyn ContentCache>,
            Arc::clone(&self.summarizer) as Arc<dyn Summarizer>,
            config,
        )
    }

    pub fn state(&self, rate_limit: RateLimitConfig) -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::clone(&self.store) as Arc<dyn JobStore>,
            Arc::clone(&self.queue) as Arc<dyn JobQueue>,
            Arc::clone(&self.cache) as Arc<dyn ContentCache>,
            Arc::clone(&self.summarizer) as Arc<dyn Summarizer>,
            RateLimiter::new(rate_limit),
        ))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Fast worker settings: immediate retries, short timeout.
pub fn fast_worker_config() -> WorkerConfig {
    WorkerConfig {
        concurrency: 1,
        max_retries: 3,
        retry_base_secs: 0,
        task_timeout_secs: 5,
        cache_ttl_secs: 3600,
    }
}

/// Start an API server for testing and return its address.
pub async fn start_test_server(
    state: Arc<AppState>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Ok((addr, handle))
}
