// src/feed/rate.rs
// =============================================================================
// This module keeps our request cadence polite.
//
// The feed API only tolerates one request every N seconds, so every outbound
// call goes through a RateLimiter first. The limiter remembers when the last
// request went out and sleeps for whatever is left of the interval.
//
// The clock is injectable (the `Clock` trait) so tests can drive time by hand
// instead of actually sleeping for 30 seconds.
//
// Rust concepts:
// - Traits with a default type parameter: RateLimiter<C = TokioClock>
// - Instant / Duration: monotonic time arithmetic
// - BoxFuture: returning a future from a trait method without async-trait
// =============================================================================

use futures::future::BoxFuture;
use std::time::{Duration, Instant};
use tracing::debug;

// Source of "now" and a way to sleep.
//
// Production code uses TokioClock; tests plug in a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Wall clock backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

// Enforces a minimum interval between consecutive requests: the gap between
// the end of one call and the start of the next is at least `interval`.
//
// The limiter is owned by whoever sends requests (the HTTP client), so there
// is no global "last request" state anywhere.
#[derive(Debug)]
pub struct RateLimiter<C = TokioClock> {
    interval: Duration,
    last_request: Option<Instant>,
    clock: C,
}

impl RateLimiter<TokioClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, TokioClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(interval: Duration, clock: C) -> Self {
        Self {
            interval,
            last_request: None,
            clock,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // Waits until at least `interval` has passed since the last recorded
    // request, then records "now" as the new last request.
    //
    // The very first call never waits. If the clock reports a time earlier
    // than the last request, the interval counts as already satisfied.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let now = self.clock.now();
            if let Some(elapsed) = now.checked_duration_since(last) {
                if elapsed < self.interval {
                    let remaining = self.interval - elapsed;
                    debug!(remaining_ms = remaining.as_millis() as u64, "throttling next request");
                    self.clock.sleep(remaining).await;
                }
            }
        }

        self.last_request = Some(self.clock.now());
    }

    // Records "now" as the last request. Called once the response (or error)
    // is back, so the next interval counts from the end of the call.
    pub fn mark(&mut self) {
        self.last_request = Some(self.clock.now());
    }
}
