//! Client-wide request spacing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum interval between consecutive requests.
///
/// One limiter is shared by every clone of a client. The lock is held while
/// waiting, so concurrent callers pass the gate one at a time and the
/// recorded timestamps are always at least `interval` apart.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum spacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Create a limiter that permits `requests` per minute.
    pub fn per_minute(requests: u32) -> Self {
        Self::new(Duration::from_secs(60) / requests.max(1))
    }

    /// The minimum spacing between two permits.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may be sent and return its permit time.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last.lock().await;

        if let Some(previous) = *last {
            let elapsed = Instant::now().saturating_duration_since(previous);
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                tokio::time::sleep(wait).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}
