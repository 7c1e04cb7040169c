//! Per-IP rate limiting for the public contact form.
//!
//! Built on governor's keyed GCRA limiter. Callers without a resolvable IP
//! are allowed through; the alternative (a shared anonymous bucket) lets
//! one broken proxy lock out every visitor.

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use std::num::NonZeroU32;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::config::ContactRateLimitConfig;

/// Shrink the keyed state store every N checks so unique IPs cannot grow
/// memory without bound.
const SHRINK_INTERVAL: u64 = 1000;

type KeyedLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock, NoOpMiddleware>;

/// Keyed limiter guarding contact-form submissions.
pub struct ContactRateLimiter {
    limiter: Arc<KeyedLimiter>,
    check_count: AtomicU64,
}

impl ContactRateLimiter {
    #[must_use]
    pub fn new(config: &ContactRateLimitConfig) -> Self {
        let max_requests =
            NonZeroU32::new(config.max_requests.max(1)).expect("max(1) is non-zero");
        let quota = Quota::with_period(std::time::Duration::from_secs(config.window_seconds))
            .expect("window is validated non-zero")
            .allow_burst(max_requests);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            check_count: AtomicU64::new(0),
        }
    }

    /// Check one submission attempt. Returns `Err(retry_after_seconds)`
    /// when the caller is over quota.
    pub fn check(&self, ip: Option<&str>) -> Result<(), u64> {
        let Some(ip) = ip else {
            return Ok(());
        };

        let count = self.check_count.fetch_add(1, Ordering::Relaxed);
        if count % SHRINK_INTERVAL == 0 && count > 0 {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&ip.to_string()) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until
                    .wait_time_from(governor::clock::Clock::now(&DefaultClock::default()));
                Err(wait.as_secs().max(1))
            }
        }
    }
}
