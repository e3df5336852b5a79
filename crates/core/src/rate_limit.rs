//! Fixed-window request limiting keyed by client.
//!
//! Each key gets a window that opens at its first request and admits up to
//! `max_requests` until `window` has elapsed. The clock is passed in, so
//! callers (and tests) control time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Limit applied to every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(60, 60)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-key fixed-window counters.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    windows: HashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            windows: HashMap::new(),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Count one request for `key` at `now`.
    ///
    /// Returns the number of requests still allowed in the current window,
    /// or [`CoreError::RateLimited`] with the seconds until the window
    /// resets. Rejected requests are not counted.
    pub fn check(&mut self, key: &str, now: Instant) -> Result<u32, CoreError> {
        let window_len = self.limit.window();
        let window = self
            .windows
            .entry(key.to_string())
            .and_modify(|w| {
                if now.saturating_duration_since(w.started) >= window_len {
                    *w = Window {
                        started: now,
                        count: 0,
                    };
                }
            })
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if window.count >= self.limit.max_requests {
            let elapsed = now.saturating_duration_since(window.started);
            let retry_after = window_len.saturating_sub(elapsed);
            // Round up so clients never retry before the reset.
            let retry_after_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            tracing::debug!(key, retry_after_secs, "Rate limit exceeded");
            return Err(CoreError::RateLimited {
                key: key.to_string(),
                retry_after_secs,
            });
        }

        window.count += 1;
        Ok(self.limit.max_requests - window.count)
    }

    /// Drop every window that has expired at `now`. Returns how many were
    /// removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let window_len = self.limit.window();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window_len);
        let removed = before - self.windows.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.windows.len(), "Pruned rate-limit windows");
        }
        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimit::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let mut limiter = RateLimiter::new(RateLimit::new(2, 10));
        let t0 = Instant::now();

        assert_eq!(limiter.check("ip", t0).unwrap(), 1);
        assert_eq!(limiter.check("ip", t0).unwrap(), 0);
        assert_matches!(
            limiter.check("ip", t0 + Duration::from_millis(2_500)),
            Err(CoreError::RateLimited { retry_after_secs: 8, .. })
        );
    }

    #[test]
    fn window_resets_after_elapsed() {
        let mut limiter = RateLimiter::new(RateLimit::new(1, 10));
        let t0 = Instant::now();

        limiter.check("ip", t0).unwrap();
        assert!(limiter.check("ip", t0 + Duration::from_secs(9)).is_err());
        assert_eq!(limiter.check("ip", t0 + Duration::from_secs(10)).unwrap(), 0);
    }

    #[test]
    fn keys_are_independent() {
        let mut limiter = RateLimiter::new(RateLimit::new(1, 60));
        let t0 = Instant::now();

        limiter.check("a", t0).unwrap();
        assert!(limiter.check("a", t0).is_err());
        assert!(limiter.check("b", t0).is_ok());
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let mut limiter = RateLimiter::new(RateLimit::new(0, 60));
        assert!(limiter.check("a", Instant::now()).is_err());
    }

    #[test]
    fn prune_evicts_only_expired_windows() {
        let mut limiter = RateLimiter::new(RateLimit::new(5, 10));
        let t0 = Instant::now();

        limiter.check("old", t0).unwrap();
        limiter.check("fresh", t0 + Duration::from_secs(8)).unwrap();

        assert_eq!(limiter.prune(t0 + Duration::from_secs(12)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.prune(t0 + Duration::from_secs(12)), 0);
    }
}
