//! Result polling and revocation handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use condense_core::fingerprint;
use condense_core::ids::JobId;
use condense_core::job::{JobState, JobTransition};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ResultResponse {
    pub result: String,
    pub meta: serde_json::Value,
}

/// `GET /api/result/{task_id}`: poll a job or resolve a cache handle.
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    if let Some(fp) = fingerprint::parse_cache_handle(&task_id) {
        return match state.cache.get_by_fingerprint(fp).await {
            Some(value) => Ok(Json(ResultResponse {
                result: value,
                meta: json!({"source": "cache"}),
            })
            .into_response()),
            None => Err(ApiError::not_found(
                "Cached result has expired or never existed",
            )),
        };
    }

    let job_id: JobId = task_id
        .parse()
        .map_err(|_| ApiError::not_found(format!("Unknown task id: {}", task_id)))?;

    let job = state
        .store
        .get(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unknown task id: {}", task_id)))?;

    debug!(job_id = %job_id, state = %job.state, "Result poll");

    match job.state {
        JobState::Pending | JobState::Started | JobState::Retrying => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "status": job.state.as_str(),
                "detail": "Task is still processing",
            })),
        )
            .into_response()),
        JobState::Succeeded => {
            let result = job.result.unwrap_or_default();
            Ok(Json(ResultResponse {
                result,
                meta: json!({
                    "task_id": task_id,
                    "state": job.state.as_str(),
                    "attempts": job.attempt_count,
                }),
            })
            .into_response())
        }
        JobState::Failed => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "task_failed",
            job.error.unwrap_or_else(|| "Task failed".to_string()),
        )),
        JobState::Revoked => Err(ApiError::new(
            StatusCode::GONE,
            "revoked",
            "Task was revoked before completion",
        )),
    }
}

/// `DELETE /api/result/{task_id}`: best-effort cooperative cancellation.
///
/// Idempotent: revoking an already-terminal job is a no-op success. Cache
/// handles are not revocable.
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if fingerprint::parse_cache_handle(&task_id).is_some() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "cache_handle",
            "Cached results are not revocable",
        ));
    }

    let job_id: JobId = task_id
        .parse()
        .map_err(|_| ApiError::not_found(format!("Unknown task id: {}", task_id)))?;

    let job = state
        .store
        .get(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unknown task id: {}", task_id)))?;

    if job.state.is_terminal() {
        return Ok(StatusCode::NO_CONTENT);
    }

    // A job mid-backoff (Retrying) is not cancellable; the revoke is
    // best-effort and the scheduled redelivery proceeds.
    if job.state.is_cancellable() {
        let job = state.store.apply(job_id, JobTransition::Revoke).await?;
        info!(job_id = %job_id, state = %job.state, "Revocation requested");
    }

    Ok(StatusCode::NO_CONTENT)
}
