//! Sliding-window submission rate limiting.
//!
//! The limiter keeps, per identity key, the timestamps of admitted attempts
//! that still fall inside the window. Once the count reaches the maximum,
//! further attempts are denied until the oldest one ages out.
//!
//! Records live in a [`DashMap`], so one limiter can be shared through an
//! `Arc` by every form in the process, including from several threads;
//! updates to a single key are serialized by the map's shard lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};

/// Default number of submissions per window.
pub const DEFAULT_MAX_SUBMISSIONS: u32 = 3;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Sweep idle keys after this many attempts.
const EVICTION_INTERVAL: u64 = 256;

/// Limits applied by a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_attempts: u32,
    window: Duration,
}

impl RateLimitConfig {
    /// Creates a config admitting `max_attempts` per `window`.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// Returns the default maximum per window.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW)
    }
}

/// Outcome of an [`attempt`](RateLimiter::attempt) or [`check`](RateLimiter::check).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the attempt is (or would be) admitted.
    pub admitted: bool,
    /// Time until the oldest attempt leaves the window. Set only on denial.
    pub retry_after: Option<Duration>,
    /// Attempts still available in the current window.
    pub remaining: u32,
}

/// Attempts recorded for one identity key, oldest first.
///
/// The active window starts at the oldest attempt still inside it.
#[derive(Debug, Default)]
struct RateLimitRecord {
    attempts: VecDeque<Instant>,
}

impl RateLimitRecord {
    /// Drops attempts that are `window` or more in the past.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.attempts.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    fn live_count(&self, now: Instant, window: Duration) -> usize {
        self.attempts
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < window)
            .count()
    }

    fn oldest_live(&self, now: Instant, window: Duration) -> Option<Instant> {
        self.attempts
            .iter()
            .copied()
            .find(|&t| now.saturating_duration_since(t) < window)
    }

    fn retry_after(&self, now: Instant, window: Duration) -> Duration {
        self.oldest_live(now, window)
            .map(|oldest| match oldest.checked_add(window) {
                Some(reopens) => reopens.saturating_duration_since(now),
                None => window.saturating_sub(now.saturating_duration_since(oldest)),
            })
            .unwrap_or(window)
    }
}

/// Per-identity sliding-window rate limiter.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use secure_form::{ManualClock, RateLimitConfig, RateLimiter};
///
/// let clock = ManualClock::new();
/// let limiter = RateLimiter::with_clock(
///     RateLimitConfig::new(2, Duration::from_secs(60)),
///     clock.clone(),
/// );
///
/// assert!(limiter.attempt("contact").admitted);
/// assert!(limiter.attempt("contact").admitted);
///
/// let denied = limiter.attempt("contact");
/// assert!(!denied.admitted);
/// assert_eq!(denied.retry_after, Some(Duration::from_secs(60)));
///
/// clock.advance(Duration::from_secs(60));
/// assert!(limiter.attempt("contact").admitted);
/// ```
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimitConfig,
    records: DashMap<String, RateLimitRecord>,
    clock: C,
    attempts_since_sweep: AtomicU64,
}

impl RateLimiter<SystemClock> {
    /// Creates a limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Creates a limiter on an injected clock.
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        Self {
            config,
            records: DashMap::new(),
            clock,
            attempts_since_sweep: AtomicU64::new(0),
        }
    }

    /// Returns the limiter's configuration.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Returns the limiter's current time.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Records an attempt for `key` under the configured maximum.
    pub fn attempt(&self, key: &str) -> RateLimitDecision {
        self.attempt_with_limit(key, self.config.max_attempts)
    }

    /// Records an attempt for `key` under a caller-supplied maximum.
    ///
    /// Denied attempts are not recorded, so hammering a blocked key does not
    /// extend the block.
    pub fn attempt_with_limit(&self, key: &str, max_attempts: u32) -> RateLimitDecision {
        let now = self.clock.now();
        let window = self.config.window;

        let decision = {
            let mut record = self.records.entry(key.to_string()).or_default();
            record.prune(now, window);

            let used = record.attempts.len();
            if used >= max_attempts as usize {
                RateLimitDecision {
                    admitted: false,
                    retry_after: Some(record.retry_after(now, window)),
                    remaining: 0,
                }
            } else {
                record.attempts.push_back(now);
                RateLimitDecision {
                    admitted: true,
                    retry_after: None,
                    remaining: max_attempts - (used as u32 + 1),
                }
            }
        };

        if !decision.admitted {
            tracing::debug!(
                key = %key,
                retry_after = ?decision.retry_after,
                "rate limit denied attempt"
            );
        }

        if self.attempts_since_sweep.fetch_add(1, Ordering::Relaxed) + 1 >= EVICTION_INTERVAL {
            self.attempts_since_sweep.store(0, Ordering::Relaxed);
            self.evict_expired();
        }

        decision
    }

    /// Reports what an attempt for `key` would return, without recording one.
    pub fn check(&self, key: &str, max_attempts: u32) -> RateLimitDecision {
        let now = self.clock.now();
        let window = self.config.window;

        let (used, retry_after) = match self.records.get(key) {
            Some(record) => (
                record.live_count(now, window),
                record.retry_after(now, window),
            ),
            None => (0, window),
        };

        if used >= max_attempts as usize {
            RateLimitDecision {
                admitted: false,
                retry_after: Some(retry_after),
                remaining: 0,
            }
        } else {
            RateLimitDecision {
                admitted: true,
                retry_after: None,
                remaining: max_attempts - used as u32,
            }
        }
    }

    /// Returns when the current window for `key` opened, if it has attempts.
    pub fn window_start(&self, key: &str) -> Option<Instant> {
        let now = self.clock.now();
        let window = self.config.window;
        self.records
            .get(key)
            .and_then(|record| record.oldest_live(now, window))
    }

    /// Removes every key with no attempts inside the window.
    ///
    /// Returns the number of keys removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window;
        let before = self.records.len();
        self.records.retain(|_, record| {
            record.prune(now, window);
            !record.attempts.is_empty()
        });
        let evicted = before.saturating_sub(self.records.len());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle rate limit records");
        }
        evicted
    }

    /// Forgets all attempts for `key`.
    pub fn reset(&self, key: &str) {
        self.records.remove(key);
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
