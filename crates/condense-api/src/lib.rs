//! HTTP API server for Condense.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use routes::create_router;
pub use state::AppState;
