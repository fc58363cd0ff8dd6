//! Inbound flood protection
//!
//! Each session may send a bounded number of events per time window.
//! Events over the limit are dropped and answered with a `RATE_LIMITED` error.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

/// Fixed-window rate limiter keyed by session id
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Map of session id to (event count, window start)
    windows: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    /// Maximum events per window
    max_events: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_events: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_events,
            window,
        }
    }

    /// Count one event for `key`.
    /// Returns true if allowed, false if rate limited
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        match windows.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) >= self.window {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_events {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                windows.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    /// Drop tracking for a session that has gone away
    pub async fn forget(&self, key: &str) {
        self.windows.write().await.remove(key);
    }

    pub async fn tracked(&self) -> usize {
        self.windows.read().await.len()
    }
}
