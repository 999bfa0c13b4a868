//! Sliding-window rate limiter
//!
//! Per-process, keyed by client address. Each key holds the timestamps of
//! its requests inside the current window; stale entries are pruned on
//! every check. Instances behind a load balancer each count separately,
//! which is accepted for a single-instance deployment.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use folio_core::RateLimitConfig;

pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key`. Returns false when the key has already
    /// used up its window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let timestamps = hits.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max_requests: usize) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max_requests,
        })
    }

    #[test]
    fn test_eleventh_request_in_window_is_rejected() {
        let limiter = limiter(60_000, 10);
        for _ in 0..10 {
            assert!(limiter.check("1.2.3.4"));
        }
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(60_000, 1);
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn test_window_expiry_readmits() {
        let limiter = limiter(40, 1);
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.check("1.2.3.4"));
    }
}
