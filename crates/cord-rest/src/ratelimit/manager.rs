//! Rate-limit manager
//!
//! Holds every bucket seen so far. A request locks its bucket for the
//! whole round trip, so at most one request per bucket is in flight and
//! the next one sees the headers of the previous response.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::StatusCode;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BucketKey, RatelimitBucket, RatelimitHeaders};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Discord's global limit for bots
const REQUESTS_PER_SECOND: u32 = 50;

/// Shared rate-limit state of one REST client
pub struct RatelimitManager {
    buckets: DashMap<BucketKey, Arc<Mutex<RatelimitBucket>>>,
    global_reset: AtomicI64,
    time_offset: OnceLock<i64>,
    limiter: DirectRateLimiter,
}

impl RatelimitManager {
    pub fn new() -> Self {
        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);
        Self {
            buckets: DashMap::new(),
            global_reset: AtomicI64::new(0),
            time_offset: OnceLock::new(),
            limiter: GovernorRateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The bucket for `key`, created on first use
    pub fn bucket(&self, key: &BucketKey) -> Arc<Mutex<RatelimitBucket>> {
        self.buckets
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(RatelimitBucket::new(key.clone()))))
            .clone()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Current time in epoch milliseconds on Discord's clock
    pub fn now(&self) -> i64 {
        Utc::now().timestamp_millis() + self.time_offset()
    }

    /// Difference between Discord's clock and ours, once a `Date` header was seen
    pub fn time_offset(&self) -> i64 {
        self.time_offset.get().copied().unwrap_or(0)
    }

    pub fn global_reset(&self) -> i64 {
        self.global_reset.load(Ordering::Acquire)
    }

    /// Lock the bucket of `key` and wait until a request may be sent.
    ///
    /// The guard must be held until the response was applied with [`Self::update`].
    pub async fn acquire(&self, key: &BucketKey) -> OwnedMutexGuard<RatelimitBucket> {
        let bucket = self.bucket(key).lock_owned().await;
        loop {
            let wait = bucket.time_till_space(self.now(), self.global_reset());
            if wait <= 0 {
                break;
            }
            tracing::debug!(
                endpoint = ?key.endpoint,
                major_param = ?key.major_param,
                wait_ms = wait,
                "Waiting for rate limit"
            );
            tokio::time::sleep(Duration::from_millis(wait.unsigned_abs())).await;
        }
        self.limiter.until_ready().await;
        bucket
    }

    /// Apply the rate-limit information of a response to its bucket
    pub fn update(
        &self,
        bucket: &mut RatelimitBucket,
        status: StatusCode,
        headers: &RatelimitHeaders,
    ) {
        if let Some(date) = headers.date {
            let offset = date.timestamp_millis() - Utc::now().timestamp_millis();
            if self.time_offset.set(offset).is_ok() {
                tracing::debug!(offset_ms = offset, "Calculated offset to Discord's clock");
            }
        }
        let now = self.now();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = headers.retry_after.unwrap_or_default();
            let reset = now + i64::try_from(retry_after.as_millis()).unwrap_or(i64::MAX / 2);
            if headers.global {
                tracing::warn!(retry_after_ms = retry_after.as_millis(), "Hit global rate limit");
                self.global_reset.fetch_max(reset, Ordering::AcqRel);
            } else {
                tracing::debug!(
                    endpoint = ?bucket.key().endpoint,
                    retry_after_ms = retry_after.as_millis(),
                    "Hit bucket rate limit"
                );
            }
            bucket.set_remaining(0);
            bucket.set_reset_at(reset);
            return;
        }

        bucket.set_remaining(headers.remaining.unwrap_or(1));
        if let Some(reset_at) = headers.reset_at {
            bucket.set_reset_at(reset_at);
        }
        if let Some(limit) = bucket.key().endpoint.and_then(|e| e.hardcoded_ratelimit()) {
            bucket.set_remaining(0);
            bucket.set_reset_at(now + i64::try_from(limit.as_millis()).unwrap_or(0));
        }
    }
}

impl Default for RatelimitManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RatelimitManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatelimitManager")
            .field("buckets", &self.buckets.len())
            .field("global_reset", &self.global_reset())
            .field("time_offset", &self.time_offset())
            .finish()
    }
}
