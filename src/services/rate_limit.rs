//! Minimum-interval rate limiter for upstream calls.
//!
//! One shared limiter for the whole process: every outbound request,
//! regardless of endpoint or cache key, waits until at least `min_interval`
//! has passed since the previous one.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as GovLimiter};
use std::time::Duration;

/// Single-bucket limiter; a burst of one makes the quota period the minimum gap.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    // `None` when the interval is zero (no limiting).
    limiter: Option<DefaultDirectRateLimiter>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            limiter: Quota::with_period(min_interval).map(GovLimiter::direct),
        }
    }

    /// Wait until a call slot is available, then claim it.
    pub async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        if limiter.check().is_err() {
            tracing::debug!(
                "Rate limit: waiting up to {:?} before upstream call",
                self.min_interval
            );
            limiter.until_ready().await;
        }
    }
}
