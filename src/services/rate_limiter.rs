//! Sliding-window rate limiter keyed by client identity.
//!
//! Each client keeps the timestamps of its admitted requests inside the
//! trailing window. The check-then-record step runs under one lock, so a
//! concurrent burst can never admit more than `max_requests` per window.
//!
//! Rate limiting is in-memory and resets on process restart.
//! It is safe to share via `Arc<RateLimiter>` across async tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

// =============================================================================
// Clock
// =============================================================================

/// Time source, injectable so tests can move time deterministically
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self { now: Mutex::new(Instant::now()) }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

// =============================================================================
// RateLimiter
// =============================================================================

/// Configuration for the rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_requests: usize,
    pub window: Duration,
}

/// In-memory rate limiter, tracks per-client request timestamps.
pub struct RateLimiter {
    clients: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_requests: config.max_requests,
            window: config.window,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check `client` against the limit. Returns `true` if the request is
    /// allowed, `false` if it is rate-limited. Records the request on `true`.
    pub fn check_and_record(&self, client: &str) -> bool {
        let mut clients = self.clients.lock();
        let now = self.clock.now();
        let window = self.window;

        let entry = clients.entry(client.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < window);

        if entry.len() >= self.max_requests {
            return false;
        }
        entry.push(now);
        true
    }

    /// Remove clients whose requests have all left the window.
    /// Returns how many clients were dropped.
    pub fn cleanup(&self) -> usize {
        let mut clients = self.clients.lock();
        let now = self.clock.now();
        let window = self.window;
        let before = clients.len();
        clients.retain(|_, entries| {
            entries.retain(|t| now.duration_since(*t) < window);
            !entries.is_empty()
        });
        before - clients.len()
    }

    /// Number of clients currently tracked
    #[cfg(test)]
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }

    /// Run `cleanup` every `period` until the task is aborted
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.cleanup();
                if removed > 0 {
                    debug!("Rate limiter sweep dropped {} idle clients", removed);
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
