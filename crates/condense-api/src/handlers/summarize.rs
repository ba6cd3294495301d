//! Summarization request handler.

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use condense_core::fingerprint;
use condense_core::job::{JobTransition, SummaryInput};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    pub length: Option<String>,
    pub format: Option<String>,
    pub extractiveness: Option<String>,
}

#[derive(Serialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub status: String,
}

/// `POST /api/summarize`: resolve from cache or create and enqueue a job.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<SummarizeRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    state.rate_limiter.check(&client_ip(&headers, addr))?;

    let input = SummaryInput::parse(
        request.text,
        request.length.as_deref(),
        request.format.as_deref(),
        request.extractiveness.as_deref(),
    )?;

    if state.cache.get(&input.text).await.is_some() {
        let fp = fingerprint::fingerprint(&input.text);
        info!(fingerprint = %&fp[..12], "Cache hit; returning resolved handle");
        return Ok((
            StatusCode::ACCEPTED,
            Json(TaskResponse {
                task_id: fingerprint::cache_handle(&fp),
                status: "completed".to_string(),
            }),
        ));
    }

    let job = state.store.create(input).await?;

    if let Err(e) = state.queue.enqueue(job.id).await {
        // Queue unavailability is fatal to creation; revoke the record so
        // polling the returned 500's job id does not show an eternal Pending.
        warn!(job_id = %job.id, error = %e, "Enqueue failed; revoking orphaned job");
        let _ = state.store.apply(job.id, JobTransition::Revoke).await;
        return Err(e.into());
    }

    info!(job_id = %job.id, chars = job.input.text.len(), "Job queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(TaskResponse {
            task_id: job.id.to_string(),
            status: job.state.to_string(),
        }),
    ))
}

/// Client identity for rate limiting: the first `x-forwarded-for` hop when
/// present (the service normally sits behind a proxy), else the peer address.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}
