use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum spacing between consecutive upstream calls.
///
/// One instance is one global limit: every caller goes through the same
/// last-call timestamp, and the lock is held while waiting so concurrent
/// callers line up one slot at a time.
pub struct RateLimiter {
    min_spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Wait until a call is allowed, then claim the slot.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_spacing {
                let wait = self.min_spacing - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limit: delaying upstream call");
                tokio::time::sleep(wait).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(1100));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(1100));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(2200));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_after_spacing_elapsed() {
        let limiter = RateLimiter::new(Duration::from_millis(1100));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1100)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut stamps = Vec::new();
        for task in tasks {
            stamps.push(task.await.unwrap());
        }
        stamps.sort();

        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(1100));
        }
        assert!(start.elapsed() >= Duration::from_millis(3300));
    }
}
