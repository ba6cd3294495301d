//! Error-to-response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use condense_core::Error;
use serde_json::json;

/// An API-surface error carrying its HTTP status and a stable error code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Validation(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", err.to_string())
            }
            Error::RateLimited { .. } => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, "rate_limited", err.to_string())
            }
            Error::JobNotFound(_) => Self::not_found(err.to_string()),
            Error::CacheHandle(_) => {
                Self::new(StatusCode::BAD_REQUEST, "cache_handle", err.to_string())
            }
            Error::BackendDegraded(_) | Error::Queue(_) | Error::Store(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "backend_degraded", err.to_string())
            }
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}
