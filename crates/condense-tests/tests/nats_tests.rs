//! Backend integration tests.
//!
//! Run with: `cargo test -p condense-tests --test nats_tests --features integration`
//! against a NATS server with JetStream enabled (default localhost:4222,
//! override with CONDENSE_NATS_URL).

#![cfg(feature = "integration")]

use condense_cache::KvCache;
use condense_core::ids::JobId;
use condense_core::job::{JobState, JobTransition};
use condense_core::ports::{ContentCache, JobQueue, JobStore};
use condense_nats::{NatsBackend, NatsConfig};
use condense_tests::fixtures::sample_input;
use std::time::Duration;
use tokio::time::timeout;

fn test_config() -> NatsConfig {
    let url = std::env::var("CONDENSE_NATS_URL")
        .unwrap_or_else(|_| "nats://localhost:4222".to_string());
    // Unique names per run so parallel test invocations do not collide.
    let run = JobId::new().as_uuid().simple().to_string();
    let mut config = NatsConfig::new(url).with_stream_name(format!("CONDENSE_TEST_{}", run));
    config.subject = format!("test.{}.jobs", run);
    config.consumer_name = format!("workers-{}", run);
    config.jobs_bucket = format!("CONDENSE_TEST_JOBS_{}", run);
    config
}

#[tokio::test]
async fn test_job_store_round_trip() {
    let backend = NatsBackend::connect(test_config())
        .await
        .expect("NATS unavailable");
    let store = backend.job_store().await.unwrap();

    let job = store.create(sample_input()).await.unwrap();
    assert_eq!(job.state, JobState::Pending);

    let fetched = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, job.id);

    let started = store.apply(job.id, JobTransition::Start).await.unwrap();
    assert_eq!(started.state, JobState::Started);

    // Illegal transition is ignored, not an error.
    let unchanged = store.apply(job.id, JobTransition::Start).await.unwrap();
    assert_eq!(unchanged.state, JobState::Started);

    assert!(store.get(JobId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_queue_delivers_and_acks() {
    let backend = NatsBackend::connect(test_config())
        .await
        .expect("NATS unavailable");
    let queue = backend.job_queue().await.unwrap();

    let job_id = JobId::new();
    queue.enqueue(job_id).await.unwrap();

    let delivery = timeout(Duration::from_secs(10), queue.dequeue())
        .await
        .expect("dequeue timed out")
        .unwrap();
    assert_eq!(delivery.job_id, job_id);
    delivery.ack().await.unwrap();

    queue.ping().await.unwrap();
}

#[tokio::test]
async fn test_nak_redelivers_after_delay() {
    let backend = NatsBackend::connect(test_config())
        .await
        .expect("NATS unavailable");
    let queue = backend.job_queue().await.unwrap();

    let job_id = JobId::new();
    queue.enqueue(job_id).await.unwrap();

    let delivery = timeout(Duration::from_secs(10), queue.dequeue())
        .await
        .expect("dequeue timed out")
        .unwrap();
    delivery.nak(Duration::from_millis(100)).await.unwrap();

    let redelivery = timeout(Duration::from_secs(10), queue.dequeue())
        .await
        .expect("redelivery timed out")
        .unwrap();
    assert_eq!(redelivery.job_id, job_id);
    redelivery.ack().await.unwrap();
}

#[tokio::test]
async fn test_kv_cache_round_trip() {
    let config = test_config();
    let backend = NatsBackend::connect(config.clone())
        .await
        .expect("NATS unavailable");
    let bucket = format!("{}_CACHE", config.jobs_bucket);
    let cache = KvCache::create(backend.jetstream(), &bucket, Duration::from_secs(600))
        .await
        .unwrap();

    assert_eq!(cache.get("some text").await, None);
    assert!(cache.set("some text", "its summary", Duration::from_secs(60)).await);
    assert_eq!(cache.get("some text").await.as_deref(), Some("its summary"));
    assert!(cache.invalidate("some text").await);
    assert_eq!(cache.get("some text").await, None);
    cache.ping().await.unwrap();
}
