//! Health check handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub details: String,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub cache: ComponentHealth,
    pub queue: ComponentHealth,
    pub collaborator: ComponentHealth,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub components: HealthComponents,
}

/// `GET /health`: per-component status rollup.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cache = match state.cache.ping().await {
        // The memory fallback answers pings but holds no durability
        // guarantee; it must be visible as degraded, not healthy.
        Ok(()) if state.cache.backend() == "memory" => ComponentHealth {
            status: "degraded".to_string(),
            details: "in-process fallback; cached results are not durable".to_string(),
        },
        Ok(()) => ComponentHealth {
            status: "up".to_string(),
            details: state.cache.backend().to_string(),
        },
        Err(e) => ComponentHealth {
            status: "down".to_string(),
            details: e.to_string(),
        },
    };

    let queue = component(state.queue.ping().await, "connected");
    let collaborator = component(state.summarizer.ping().await, "configured");

    let all_up = [&cache, &queue, &collaborator]
        .iter()
        .all(|c| c.status == "up");

    Json(HealthResponse {
        status: if all_up { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components: HealthComponents {
            cache,
            queue,
            collaborator,
        },
    })
}

fn component(ping: condense_core::Result<()>, up_details: &str) -> ComponentHealth {
    match ping {
        Ok(()) => ComponentHealth {
            status: "up".to_string(),
            details: up_details.to_string(),
        },
        Err(e) => ComponentHealth {
            status: "down".to_string(),
            details: e.to_string(),
        },
    }
}

/// `GET /`: service banner.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Condense API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
