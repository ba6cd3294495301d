//! Application state shared across handlers.

use crate::rate_limit::RateLimiter;
use condense_core::ports::{ContentCache, JobQueue, JobStore, Summarizer};
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// Holds the port implementations and the process-scoped rate limiter; no
/// ambient globals.
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<dyn JobQueue>,
    pub cache: Arc<dyn ContentCache>,
    pub summarizer: Arc<dyn Summarizer>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        cache: Arc<dyn ContentCache>,
        summarizer: Arc<dyn Summarizer>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            store,
            queue,
            cache,
            summarizer,
            rate_limiter,
        }
    }
}
