//! Subcommand handlers: process wiring for the API server and worker pool.

use crate::config::ServiceConfig;
use condense_api::{AppState, RateLimiter, create_router};
use condense_cache::{KvCache, MemoryCache};
use condense_core::ports::ContentCache;
use condense_nats::NatsBackend;
use condense_summarizer::HttpSummarizer;
use condense_worker::{LogObserver, Worker};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Run the HTTP API server until interrupted.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let backend = connect(&config).await?;

    let store = Arc::new(backend.job_store().await?);
    let queue = Arc::new(backend.job_queue().await?);
    let cache = open_cache(&backend, &config).await;
    let summarizer = Arc::new(HttpSummarizer::new(config.summarizer())?);

    let state = Arc::new(AppState::new(
        store,
        queue,
        cache,
        summarizer,
        RateLimiter::new(config.rate_limit.clone()),
    ));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "API server listening");

    axum::serve(
        listener,
        create_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("API server stopped");
    Ok(())
}

/// Run the worker pool until interrupted; in-flight jobs drain first.
pub async fn worker(config: ServiceConfig) -> anyhow::Result<()> {
    let backend = connect(&config).await?;

    let store = Arc::new(backend.job_store().await?);
    let queue = Arc::new(backend.job_queue().await?);
    let cache = open_cache(&backend, &config).await;
    let summarizer = Arc::new(HttpSummarizer::new(config.summarizer())?);

    let worker = Arc::new(
        Worker::new(store, queue, cache, summarizer, config.worker.clone())
            .with_observer(Arc::new(LogObserver::new())),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();
    for _ in 0..config.worker.concurrency.max(1) {
        let worker = Arc::clone(&worker);
        let shutdown_rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        }));
    }

    info!(tasks = handles.len(), "Worker pool started");

    shutdown_signal().await;
    info!("Draining worker pool");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    info!("Worker pool stopped");
    Ok(())
}

async fn connect(config: &ServiceConfig) -> anyhow::Result<NatsBackend> {
    let backend = NatsBackend::connect(config.nats())
        .await
        .map_err(|e| anyhow::anyhow!("Queue backend unavailable: {}", e))?;
    info!(state = ?backend.connection_state(), "NATS connection established");
    Ok(backend)
}

/// Open the durable cache bucket, falling back to the in-process map.
///
/// The fallback keeps requests flowing when the bucket cannot be opened,
/// but holds nothing across restarts; health reports it as degraded.
async fn open_cache(backend: &NatsBackend, config: &ServiceConfig) -> Arc<dyn ContentCache> {
    match KvCache::create(backend.jetstream(), &config.cache_bucket, config.cache_ttl()).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(
                error = %e,
                "Durable cache unavailable; using in-process fallback without persistence"
            );
            Arc::new(MemoryCache::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
