//! Fixed-window request budget per identity.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

/// Windows are pruned once the map grows past this many identities.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    count: u32,
    started_at: Instant,
}

/// Per-identity rate limiter
///
/// Within one window the count never exceeds `max_requests`; the window
/// restarts on the first request after it elapses.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, RateLimitWindow>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Take one request from `identity`'s budget. Returns `false` when exhausted.
    pub async fn try_acquire(&self, identity: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started_at) < window);
        }

        let entry = windows
            .entry(identity.to_string())
            .or_insert(RateLimitWindow {
                count: 0,
                started_at: now,
            });

        if now.duration_since(entry.started_at) >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Remaining budget for `identity` in its current window
    pub async fn remaining(&self, identity: &str) -> u32 {
        let now = Instant::now();
        let windows = self.windows.lock().await;
        match windows.get(identity) {
            Some(w) if now.duration_since(w.started_at) < self.window => {
                self.max_requests.saturating_sub(w.count)
            }
            _ => self.max_requests,
        }
    }
}
