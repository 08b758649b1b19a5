//! Per-host rate limiting (spec §5).
//!
//! One `governor` token bucket per external host: the catalog client and
//! every provider adapter share a single concurrency primitive so the core
//! never has to reason about two different backpressure mechanisms.

use governor::{Quota, RateLimiter};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;

type HostLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A registry of one token bucket per host, created lazily on first use.
pub struct HostRateLimiters {
    requests_per_second: NonZeroU32,
    buckets: Mutex<HashMap<String, std::sync::Arc<HostLimiter>>>,
}

impl HostRateLimiters {
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            requests_per_second: NonZeroU32::new(requests_per_second.max(1)).unwrap(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn bucket_for(&self, host: &str) -> std::sync::Arc<HostLimiter> {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        buckets
            .entry(host.to_string())
            .or_insert_with(|| {
                std::sync::Arc::new(RateLimiter::direct(Quota::per_second(self.requests_per_second)))
            })
            .clone()
    }

    /// Block the caller until a request to `host` is allowed to proceed.
    pub async fn acquire(&self, host: &str) {
        let bucket = self.bucket_for(host);
        bucket.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_does_not_panic_for_fresh_host() {
        let limiters = HostRateLimiters::new(5);
        limiters.acquire("musicbrainz.org").await;
        limiters.acquire("musicbrainz.org").await;
    }

    #[tokio::test]
    async fn separate_hosts_get_separate_buckets() {
        let limiters = HostRateLimiters::new(1);
        limiters.acquire("host-a").await;
        limiters.acquire("host-b").await;
        assert_eq!(limiters.buckets.lock().unwrap().len(), 2);
    }
}
