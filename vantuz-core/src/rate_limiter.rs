//! Rate Limiter Module
//!
//! Gates the start of outbound exchanges so that at most `max_requests`
//! begin within any `per` window. Permits are spaced evenly: one every
//! `per / max_requests`.
//!
//! Waiting honours a [`CancellationToken`]. A cancelled wait returns
//! [`Error::Cancelled`] and gives its reserved slot back when no later
//! reservation has been made.
//!
//! # Example
//!
//! ```rust
//! use vantuz_core::rate_limiter::{RateLimiter, RateLimiterConfig};
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! # async fn example() -> vantuz_core::Result<()> {
//! // 5 requests per second, one every 200ms
//! let limiter = RateLimiter::new(RateLimiterConfig::new(5, Duration::from_secs(1)));
//!
//! let cancel = CancellationToken::new();
//! limiter.wait(&cancel).await?;
//! // Make your request here
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Rate limiter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Length of the window
    pub per: Duration,
}

impl RateLimiterConfig {
    /// Create a new rate limiter configuration
    ///
    /// ```rust
    /// use vantuz_core::rate_limiter::RateLimiterConfig;
    /// use std::time::Duration;
    ///
    /// // 100 requests per minute
    /// let config = RateLimiterConfig::new(100, Duration::from_secs(60));
    /// assert_eq!(config.interval(), Duration::from_millis(600));
    /// ```
    pub fn new(max_requests: u32, per: Duration) -> Self {
        Self { max_requests, per }
    }

    /// False when the combination cannot describe a limit: no requests, or
    /// an empty window.
    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0 && !self.per.is_zero()
    }

    /// Spacing between two consecutive permits.
    pub fn interval(&self) -> Duration {
        if self.max_requests == 0 {
            return Duration::ZERO;
        }
        self.per / self.max_requests
    }
}

/// Longest spacing the limiter schedules. Anything above is treated as
/// "never again" without risking `Instant` overflow.
const MAX_INTERVAL: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `slot + interval`, saturating instead of panicking on overflow.
fn advance(slot: Instant, interval: Duration) -> Instant {
    slot.checked_add(interval).unwrap_or(slot)
}

#[derive(Debug)]
struct RateLimiterState {
    /// Earliest instant the next permit may be granted
    next_slot: Instant,
    interval: Duration,
}

impl RateLimiterState {
    fn new(interval: Duration) -> Self {
        Self {
            next_slot: Instant::now(),
            interval,
        }
    }

    /// Books the next free slot and returns it.
    fn reserve(&mut self, now: Instant) -> Instant {
        let slot = self.next_slot.max(now);
        self.next_slot = advance(slot, self.interval);
        slot
    }

    /// Returns an unused slot, unless someone booked after it.
    fn release(&mut self, slot: Instant) {
        if self.next_slot == advance(slot, self.interval) {
            self.next_slot = slot;
        }
    }
}

/// Rate limiter handing out evenly spaced permits.
///
/// Cloning is cheap and clones share state, so one limiter can gate many
/// concurrent tasks.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Arc<Mutex<RateLimiterState>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    ///
    /// A disabled configuration (see [`RateLimiterConfig::is_enabled`])
    /// yields a limiter that never waits.
    pub fn new(config: RateLimiterConfig) -> Self {
        let interval = if config.is_enabled() {
            config.interval().min(MAX_INTERVAL)
        } else {
            Duration::ZERO
        };
        Self {
            config,
            state: Arc::new(Mutex::new(RateLimiterState::new(interval))),
        }
    }

    /// Builds a limiter for `max_requests` per `per`, or `None` when the
    /// combination disables limiting.
    pub fn per(max_requests: u32, per: Duration) -> Option<Self> {
        let config = RateLimiterConfig::new(max_requests, per);
        config.is_enabled().then(|| Self::new(config))
    }

    /// Returns the configuration this limiter was built from.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Waits until a permit is available or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the token is cancelled before or
    /// during the wait. No permit is consumed in that case.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::cancelled("rate limiter wait cancelled"));
        }

        let slot = {
            let mut state = self.state.lock().await;
            state.reserve(Instant::now())
        };

        if slot <= Instant::now() {
            return Ok(());
        }

        debug!(
            delay_ms = %slot.saturating_duration_since(Instant::now()).as_millis(),
            "Waiting for rate limiter permit"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.state.lock().await.release(slot);
                Err(Error::cancelled("rate limiter wait cancelled"))
            }
            () = sleep_until(slot) => Ok(()),
        }
    }

    /// Takes a permit only if one is available right now.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if state.next_slot > now {
            return false;
        }
        state.reserve(now);
        true
    }

    /// Time until the next permit becomes available.
    pub async fn time_until_ready(&self) -> Duration {
        let state = self.state.lock().await;
        state.next_slot.saturating_duration_since(Instant::now())
    }

    /// Forgets all outstanding reservations.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.next_slot = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_config() {
        let config = RateLimiterConfig::new(5, Duration::from_secs(1));
        assert!(config.is_enabled());
        assert_eq!(config.interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_rate_limiter_config_disabled() {
        assert!(!RateLimiterConfig::new(0, Duration::from_secs(1)).is_enabled());
        assert!(!RateLimiterConfig::new(5, Duration::ZERO).is_enabled());
        assert_eq!(
            RateLimiterConfig::new(0, Duration::from_secs(1)).interval(),
            Duration::ZERO
        );
    }

    #[test]
    fn test_per_returns_none_when_disabled() {
        assert!(RateLimiter::per(0, Duration::from_secs(1)).is_none());
        assert!(RateLimiter::per(10, Duration::ZERO).is_none());
        assert!(RateLimiter::per(10, Duration::from_secs(1)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permits_are_evenly_spaced() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(5, Duration::from_secs(1)));
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let mut grants = Vec::new();
        for _ in 0..10 {
            limiter.wait(&cancel).await.unwrap();
            grants.push(start.elapsed());
        }

        for (i, granted) in grants.iter().enumerate() {
            assert_eq!(*granted, Duration::from_millis(200) * i as u32);
        }
        for window in grants.windows(6) {
            assert!(window[5] - window[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_acquire() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(2, Duration::from_millis(100)));

        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_before_start() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(1, Duration::from_secs(1)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = limiter.wait(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        // The cancelled call consumed nothing.
        assert!(limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_while_waiting_releases_slot() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(1, Duration::from_secs(10)));
        let cancel = CancellationToken::new();

        limiter.wait(&cancel).await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.wait(&cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(limiter.time_until_ready().await, Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(1, Duration::from_secs(60)));
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);

        limiter.reset().await;
        assert!(limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_access() {
        let limiter = RateLimiter::new(RateLimiterConfig::new(10, Duration::from_secs(1)));
        let start = Instant::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait(&CancellationToken::new()).await.unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        // Ten permits at 100ms spacing: the last is granted at 900ms.
        assert_eq!(start.elapsed(), Duration::from_millis(900));
        assert_eq!(limiter.time_until_ready().await, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_does_not_overflow() {
        let limiter = RateLimiter::per(1, Duration::MAX).unwrap();
        let cancel = CancellationToken::new();

        limiter.wait(&cancel).await.unwrap();
        assert_eq!(limiter.time_until_ready().await, MAX_INTERVAL);

        let waiter = {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.wait(&cancel).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        assert!(waiter.await.unwrap().unwrap_err().is_cancelled());
        assert!(!limiter.try_acquire().await);
    }
}
