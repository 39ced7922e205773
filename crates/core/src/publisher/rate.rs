//! Trailing-window rate limiting over the publish history.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::config::RateLimitConfig;
use super::error::{AttemptError, RateLimitError, RateLimitScope};
use crate::formats::Platform;
use crate::history::{RateLimitStore, StoreError};

/// Global usage seen by one batch.
///
/// The baseline is taken once when the batch starts; attempts dispatched by
/// the batch itself are counted locally on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    pub baseline: u64,
    pub dispatched: u64,
}

/// Checks attempts against per-platform and global caps.
///
/// Both checks fail closed: a store error refuses the attempt.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self { config, store }
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.config.window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Reads the global baseline for a new batch.
    pub fn open_window(&self, now: DateTime<Utc>) -> Result<BatchWindow, StoreError> {
        let baseline = self.store.count_since(None, self.window_start(now))?;
        debug!(
            "Rate window opened: {} publishes in the last {}s",
            baseline, self.config.window_secs
        );
        Ok(BatchWindow {
            baseline,
            dispatched: 0,
        })
    }

    /// Per-platform cap first, then the global cap.
    pub fn check(
        &self,
        window: &BatchWindow,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<(), AttemptError> {
        let platform_count = self
            .store
            .count_since(Some(platform), self.window_start(now))?;
        if platform_count >= self.config.per_platform_max {
            return Err(RateLimitError {
                platform,
                scope: RateLimitScope::Platform,
                count: platform_count,
                max: self.config.per_platform_max,
                window_secs: self.config.window_secs,
            }
            .into());
        }

        let global_count = window.baseline + window.dispatched;
        if global_count >= self.config.global_max {
            return Err(RateLimitError {
                platform,
                scope: RateLimitScope::Global,
                count: global_count,
                max: self.config.global_max,
                window_secs: self.config.window_secs,
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryRateLimitStore;

    fn limiter(store: Arc<MemoryRateLimitStore>) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default(), store)
    }

    #[test]
    fn test_platform_cap() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let now = Utc::now();
        for minutes in [5, 10, 15] {
            store
                .record(Platform::Facebook, now - Duration::minutes(minutes))
                .unwrap();
        }
        let limiter = limiter(store);
        let window = limiter.open_window(now).unwrap();
        assert_eq!(window.baseline, 3);

        let err = limiter.check(&window, Platform::Facebook, now).unwrap_err();
        match err {
            AttemptError::RateLimited(e) => {
                assert_eq!(e.scope, RateLimitScope::Platform);
                assert_eq!(e.count, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(limiter.check(&window, Platform::Twitter, now).is_ok());
    }

    #[test]
    fn test_old_publishes_fall_out_of_window() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let now = Utc::now();
        for minutes in [61, 90, 120] {
            store
                .record(Platform::Facebook, now - Duration::minutes(minutes))
                .unwrap();
        }
        let limiter = limiter(store);
        let window = limiter.open_window(now).unwrap();
        assert_eq!(window.baseline, 0);
        assert!(limiter.check(&window, Platform::Facebook, now).is_ok());
    }

    #[test]
    fn test_global_cap_counts_batch_dispatches() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let now = Utc::now();
        store.record(Platform::Facebook, now - Duration::minutes(1)).unwrap();
        store.record(Platform::Twitter, now - Duration::minutes(2)).unwrap();
        store.record(Platform::Linkedin, now - Duration::minutes(3)).unwrap();

        let limiter = limiter(store);
        let mut window = limiter.open_window(now).unwrap();
        assert!(limiter.check(&window, Platform::Tiktok, now).is_ok());

        window.dispatched = 2;
        let err = limiter.check(&window, Platform::Youtube, now).unwrap_err();
        match err {
            AttemptError::RateLimited(e) => {
                assert_eq!(e.scope, RateLimitScope::Global);
                assert_eq!(e.count, 5);
                assert!(e.to_string().contains("rate limit exceeded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
