//! Error types for Condense.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Request errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limit exceeded: maximum {limit} requests per {window_secs} seconds")]
    RateLimited { limit: u32, window_secs: u64 },

    // Job errors
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Cached results are not revocable: {0}")]
    CacheHandle(String),

    // Collaborator errors
    #[error("Transient collaborator failure: {0}")]
    Transient(String),

    #[error("Permanent collaborator failure: {0}")]
    Permanent(String),

    // Infrastructure errors
    #[error("Backend degraded: {0}")]
    BackendDegraded(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Failure returned by the external summarization collaborator.
///
/// The worker treats the collaborator as an opaque remote call that either
/// produces a summary or fails in one of two classes: transient failures are
/// retried with backoff, permanent ones fail the job immediately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummarizeFailure {
    #[error("transient: {0}")]
    Transient(String),

    #[error("permanent: {0}")]
    Permanent(String),
}

impl SummarizeFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, SummarizeFailure::Transient(_))
    }
}
