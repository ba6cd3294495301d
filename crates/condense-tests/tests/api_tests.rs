//! API integration tests against in-memory backends.

use condense_api::RateLimitConfig;
use condense_core::job::JobState;
use condense_core::ports::{JobQueue, JobStore};
use condense_tests::fixtures::{SAMPLE_TEXT, summarize_body, summarize_body_with};
use condense_tests::helpers::{TestHarness, fast_worker_config, start_test_server};
use condense_tests::memory::{ScriptStep, ScriptedSummarizer};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;

async fn serve(harness: &TestHarness) -> String {
    let (addr, _handle) = start_test_server(harness.state(RateLimitConfig::default()))
        .await
        .expect("Failed to start server");
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_root_and_health() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    // The in-memory cache is the degraded fallback and must show as such.
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["cache"]["status"], "degraded");
    assert_eq!(body["components"]["queue"]["status"], "up");
    assert_eq!(body["components"]["collaborator"]["status"], "up");
}

#[tokio::test]
async fn test_invalid_length_is_rejected_before_job_creation() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body_with(SAMPLE_TEXT, "urgent", "paragraph", "low"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(harness.store.is_empty(), "no job may be created");
}

#[tokio::test]
async fn test_blank_text_is_rejected() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body("   "))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_submit_then_poll_pending() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body(SAMPLE_TEXT))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json().await.unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();
    assert!(task_id.starts_with("job_"));
    assert_eq!(body["status"], "pending");

    let resp = client
        .get(format!("{}/api/result/{}", base, task_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_unknown_task_id_is_404() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    for id in ["job_00000000-0000-0000-0000-000000000000", "not-an-id"] {
        let resp = client
            .get(format!("{}/api/result/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "id {}", id);
    }
}

#[tokio::test]
async fn test_full_round_trip_and_cache_hit() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body(SAMPLE_TEXT))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    // Drive the worker over the queued job.
    let worker = harness.worker(fast_worker_config());
    let delivery = harness.queue.dequeue().await.unwrap();
    worker.process(delivery).await;

    let resp = client
        .get(format!("{}/api/result/{}", base, task_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    let result = body["result"].as_str().unwrap().to_string();
    assert!(!result.is_empty());
    assert_eq!(body["meta"]["state"], "succeeded");

    // Identical resubmission resolves from cache with a handle.
    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body(SAMPLE_TEXT))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "completed");
    let handle = body["task_id"].as_str().unwrap().to_string();
    assert!(handle.starts_with("cached_"));

    // The handle resolves to the same bytes the worker cached.
    let resp = client
        .get(format!("{}/api/result/{}", base, handle))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["result"].as_str().unwrap(), result);
    assert_eq!(body["meta"]["source"], "cache");

    // Cache handles are not revocable.
    let resp = client
        .delete(format!("{}/api/result/{}", base, handle))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "cache_handle");
}

#[tokio::test]
async fn test_failed_job_surfaces_error_detail() {
    let harness = TestHarness::with_summarizer(ScriptedSummarizer::script([
        ScriptStep::Permanent("input rejected by model".to_string()),
    ]));
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body(SAMPLE_TEXT))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let worker = harness.worker(fast_worker_config());
    let delivery = harness.queue.dequeue().await.unwrap();
    worker.process(delivery).await;

    let resp = client
        .get(format!("{}/api/result/{}", base, task_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "task_failed");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("input rejected by model")
    );
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body(SAMPLE_TEXT))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let resp = client
        .delete(format!("{}/api/result/{}", base, task_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let job_id = task_id.parse().unwrap();
    let job = harness.store.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Revoked);

    // Second revoke of the now-terminal job: no-op success, no state change.
    let resp = client
        .delete(format!("{}/api/result/{}", base, task_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let job = harness.store.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Revoked);

    // The worker discards the delivery without calling the collaborator.
    let worker = harness.worker(fast_worker_config());
    let delivery = harness.queue.dequeue().await.unwrap();
    worker.process(delivery).await;
    assert_eq!(harness.summarizer.calls(), 0);

    let resp = client
        .get(format!("{}/api/result/{}", base, task_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_revoke_unknown_task_is_404() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!(
            "{}/api/result/job_00000000-0000-0000-0000-000000000000",
            base
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_kicks_in_on_eleventh_request() {
    let harness = TestHarness::new();
    let base = serve(&harness).await;
    let client = reqwest::Client::new();

    for i in 0..10 {
        let resp = client
            .post(format!("{}/api/summarize", base))
            .json(&summarize_body(&format!("document number {}", i)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED, "request {}", i);
    }

    let resp = client
        .post(format!("{}/api/summarize", base))
        .json(&summarize_body("one over the limit"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "rate_limited");
}
