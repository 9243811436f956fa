//! Request pacing
//!
//! The platform has no published rate limits, only an informal expectation
//! that clients stay gentle. Every request waits until at least `min_delay`
//! has passed since the previous request finished, whatever its outcome.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Minimum-delay rate limiter shared by every request of a scrape
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_delay: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter that keeps `min_delay` between consecutive requests
    pub fn min_delay(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a limiter that never waits
    pub fn unlimited() -> Self {
        Self::min_delay(Duration::ZERO)
    }

    /// Configured delay between requests
    pub fn delay(&self) -> Duration {
        self.min_delay
    }

    /// Wait for the next request slot
    ///
    /// The returned permit must be held for the duration of the request.
    /// Dropping it marks the request as finished, which is where the next
    /// delay is measured from. Dropping happens on success and failure alike.
    pub async fn acquire(&self) -> RequestPermit {
        let wait = self.remaining_wait(Instant::now());
        if !wait.is_zero() {
            debug!("Rate limiter sleeping for {:?}", wait);
            sleep(wait).await;
        }

        // Start time for now; the permit moves it to the completion time on drop
        self.mark(Instant::now());
        RequestPermit {
            last_request: Arc::clone(&self.last_request),
        }
    }

    /// Time still to wait at `now` before the next request may start
    fn remaining_wait(&self, now: Instant) -> Duration {
        let last = *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match last {
            Some(last) => (last + self.min_delay).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    fn mark(&self, at: Instant) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(at);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::min_delay(super::config::DEFAULT_MIN_DELAY)
    }
}

/// Proof that a request slot was granted
///
/// Records the request's completion time when dropped.
#[derive(Debug)]
#[must_use = "the permit must live as long as the request"]
pub struct RequestPermit {
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl Drop for RequestPermit {
    fn drop(&mut self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(Instant::now());
    }
}
