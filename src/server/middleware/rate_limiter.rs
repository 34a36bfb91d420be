//! Fixed-window rate limiting and slow-down
//!
//! Three independent windows per client address: general requests, failed
//! authentications and bulk writes. A slow-down layer delays requests once a
//! client passes a softer threshold inside the general window; the delay
//! doubles with every further request up to a cap.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Tracks hits for a single client inside the current window
struct WindowTracker {
    count: u32,
    window_start: Instant,
}

/// Fixed-window counter keyed by client
pub struct FixedWindowLimiter {
    windows: DashMap<String, WindowTracker>,
    max_hits: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_hits: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_hits,
            window,
        }
    }

    /// Count one hit; `Err` carries the seconds until the window resets
    ///
    /// On success returns the number of hits in the current window,
    /// including this one.
    pub fn hit(&self, client_id: &str) -> Result<u32, u64> {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| WindowTracker {
                count: 0,
                window_start: now,
            });

        let tracker = entry.value_mut();
        if now.duration_since(tracker.window_start) >= self.window {
            tracker.count = 0;
            tracker.window_start = now;
        }

        tracker.count = tracker.count.saturating_add(1);
        if tracker.count > self.max_hits {
            return Err(self.retry_after(tracker, now));
        }
        Ok(tracker.count)
    }

    /// Check without counting; `Err` while the limit is reached
    pub fn check(&self, client_id: &str) -> Result<(), u64> {
        let now = Instant::now();
        match self.windows.get(client_id) {
            Some(tracker)
                if now.duration_since(tracker.window_start) < self.window
                    && tracker.count >= self.max_hits =>
            {
                Err(self.retry_after(&tracker, now))
            }
            _ => Ok(()),
        }
    }

    fn retry_after(&self, tracker: &WindowTracker, now: Instant) -> u64 {
        let remaining = self
            .window
            .saturating_sub(now.duration_since(tracker.window_start));
        (remaining.as_secs_f64().ceil() as u64).max(1)
    }

    /// Drop trackers whose window has expired
    pub fn cleanup_old_entries(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, tracker| now.duration_since(tracker.window_start) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Growing delay once a client exceeds a soft threshold
#[derive(Debug, Clone)]
pub struct SlowDown {
    after: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl SlowDown {
    pub fn new(after: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            after,
            base_delay,
            max_delay,
        }
    }

    /// Delay for the `hits`-th request in the window
    pub fn delay_for(&self, hits: u32) -> Duration {
        if hits <= self.after {
            return Duration::ZERO;
        }
        let excess = hits - self.after - 1;
        let factor = 2u32.checked_pow(excess).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// All request throttles for the gateway
pub struct RateLimiter {
    enabled: bool,
    general: FixedWindowLimiter,
    auth_failures: FixedWindowLimiter,
    bulk: FixedWindowLimiter,
    slow_down: SlowDown,
}

impl RateLimiter {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            general: FixedWindowLimiter::new(
                config.max_requests,
                Duration::from_secs(config.window_secs),
            ),
            auth_failures: FixedWindowLimiter::new(
                config.auth_max_failures,
                Duration::from_secs(config.auth_window_secs),
            ),
            bulk: FixedWindowLimiter::new(
                config.bulk_max_requests,
                Duration::from_secs(config.bulk_window_secs),
            ),
            slow_down: SlowDown::new(
                config.slow_down_after,
                Duration::from_millis(config.slow_down_delay_ms),
                Duration::from_millis(config.slow_down_max_delay_ms),
            ),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Admit a request; `Ok` carries the delay to apply before serving it
    pub fn check_request(&self, client_id: &str, bulk_write: bool) -> Result<Duration, u64> {
        if !self.enabled {
            return Ok(Duration::ZERO);
        }
        let hits = self.general.hit(client_id)?;
        if bulk_write {
            self.bulk.hit(client_id)?;
        }
        Ok(self.slow_down.delay_for(hits))
    }

    /// `Err` while the client has too many recent authentication failures
    pub fn check_auth_allowed(&self, client_id: &str) -> Result<(), u64> {
        if !self.enabled {
            return Ok(());
        }
        self.auth_failures.check(client_id)
    }

    pub fn record_auth_failure(&self, client_id: &str) {
        if self.enabled {
            // The next request is the one that gets rejected
            let _ = self.auth_failures.hit(client_id);
        }
    }

    pub fn cleanup_old_entries(&self) {
        self.general.cleanup_old_entries();
        self.auth_failures.cleanup_old_entries();
        self.bulk.cleanup_old_entries();
    }
}
