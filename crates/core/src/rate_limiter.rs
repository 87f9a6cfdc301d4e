//! A minimum-interval guard for rate-sensitive tools.

use std::time::Duration;

use tokio::time::{Instant, sleep};

/// The shortest time allowed between two passes through the limiter.
pub const MIN_INTERVAL: Duration = Duration::from_secs(2);

/// Enforces a minimum interval between calls.
///
/// The limiter only remembers when it was last passed. It has no idea what
/// happened after that, so a caller gating an opaque agent turn ends up
/// throttling turns rather than individual tool invocations.
///
/// Time is read from the tokio clock, which makes the limiter testable with
/// a paused runtime.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter with [`MIN_INTERVAL`] that has never been passed.
    #[inline]
    pub fn new() -> Self {
        Self::with_min_interval(MIN_INTERVAL)
    }

    /// Creates a limiter with a custom interval.
    #[inline]
    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Returns the configured interval.
    #[inline]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns when the limiter was last passed, `None` if never.
    #[inline]
    pub fn last_call(&self) -> Option<Instant> {
        self.last_call
    }

    /// Returns how long a caller arriving at `now` would have to wait.
    pub fn deficit_at(&self, now: Instant) -> Duration {
        match self.last_call {
            Some(last_call) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last_call)),
            None => Duration::ZERO,
        }
    }

    /// Waits until the interval has passed since the last call, then records
    /// the current time as the last call. Returns how long it waited.
    #[inline]
    pub async fn acquire(&mut self) -> Duration {
        self.acquire_with(|_| {}).await
    }

    /// Like [`RateLimiter::acquire`], but reports the wait to `on_wait`
    /// before sleeping. `on_wait` is not called when no wait is needed.
    pub async fn acquire_with(
        &mut self,
        on_wait: impl FnOnce(Duration),
    ) -> Duration {
        let deficit = self.deficit_at(Instant::now());
        if !deficit.is_zero() {
            debug!("rate limited, waiting for {:.2}s", deficit.as_secs_f64());
            on_wait(deficit);
            sleep(deficit).await;
        }
        // Recorded after the wait, so the next interval starts from here.
        self.last_call = Some(Instant::now());
        deficit
    }
}

impl Default for RateLimiter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
