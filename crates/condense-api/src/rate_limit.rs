//! Fixed-window request rate limiting.

use condense_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window per client.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

struct Window {
    count: u32,
    window_start: Instant,
}

/// Fixed-window counter keyed by client identity.
///
/// Owned by [`crate::AppState`] and shared by all request tasks; per-key
/// updates happen under one mutex, so concurrent requests cannot lose
/// counts. Stale windows are swept on every lookup, not by a background
/// task.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key`, failing if the client exceeded its
    /// window allowance.
    pub fn check(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let window = Duration::from_secs(self.config.window_secs);
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");

        // Lazy sweep: any key's stale window goes away on the next lookup.
        windows.retain(|_, w| now.duration_since(w.window_start) < window);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            window_start: now,
        });

        if entry.count >= self.config.max_requests {
            return Err(Error::RateLimited {
                limit: self.config.max_requests,
                window_secs: self.config.window_secs,
            });
        }

        entry.count += 1;
        Ok(())
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}
