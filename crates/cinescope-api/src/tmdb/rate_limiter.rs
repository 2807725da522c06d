//! TMDB API rate limiter.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default number of requests allowed per window (~40 req/s).
pub const DEFAULT_LIMIT: usize = 40;

/// Default window length.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Sliding-window rate limiter for the TMDB API.
///
/// Records the instant of every admitted call and admits at most `limit`
/// calls within any trailing `interval`. Callers over the limit are delayed
/// until the oldest recorded call leaves the window; nothing is ever rejected.
///
/// The limiter itself is not synchronized. `TmdbClient` keeps it behind an
/// async mutex held across the whole check, sleep and record sequence.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SlidingWindowLimiter {
    /// Maximum number of calls per window.
    limit: usize,
    /// Window length.
    interval: Duration,
    /// Admitted call timestamps, oldest first.
    calls: VecDeque<Instant>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter admitting `limit` calls per `interval`.
    ///
    /// A `limit` of zero is treated as one.
    #[must_use]
    pub fn new(limit: usize, interval: Duration) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            interval,
            calls: VecDeque::with_capacity(limit.min(64)),
        }
    }

    /// Returns the configured call limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the configured window length.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until one more call fits in the trailing window, then records it.
    pub async fn wait_if_needed(&mut self) {
        self.trim(Instant::now());

        while self.calls.len() >= self.limit {
            let Some(delay) = self.delay_until_slot(Instant::now()) else {
                break;
            };
            tracing::debug!(
                delay_ms = delay.as_millis(),
                limit = self.limit,
                "TMDB rate limit window full. Waiting..."
            );
            tokio::time::sleep(delay).await;
            self.trim(Instant::now());
        }

        self.calls.push_back(Instant::now());
    }

    /// Drops recorded calls whose age is at least `interval`.
    fn trim(&mut self, now: Instant) {
        while self
            .calls
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.interval)
        {
            self.calls.pop_front();
        }
    }

    /// Time left until the oldest recorded call exits the window.
    fn delay_until_slot(&self, now: Instant) -> Option<Duration> {
        let oldest = *self.calls.front()?;
        let age = now.saturating_duration_since(oldest);
        Some(self.interval.saturating_sub(age))
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_INTERVAL)
    }
}
