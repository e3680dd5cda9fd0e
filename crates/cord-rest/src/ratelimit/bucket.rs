//! Rate-limit bucket state

use crate::endpoint::RestEndpoint;

/// Requests sharing an endpoint and major parameter share a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub endpoint: Option<RestEndpoint>,
    pub major_param: Option<String>,
}

impl BucketKey {
    pub fn new(endpoint: Option<RestEndpoint>, major_param: Option<String>) -> Self {
        Self {
            endpoint,
            major_param,
        }
    }
}

/// Remaining requests and reset time of one bucket.
///
/// Times are epoch milliseconds on Discord's clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatelimitBucket {
    key: BucketKey,
    remaining: u32,
    reset_at: i64,
}

impl RatelimitBucket {
    pub fn new(key: BucketKey) -> Self {
        Self {
            key,
            remaining: 1,
            reset_at: 0,
        }
    }

    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn set_remaining(&mut self, remaining: u32) {
        self.remaining = remaining;
    }

    pub fn reset_at(&self) -> i64 {
        self.reset_at
    }

    pub fn set_reset_at(&mut self, reset_at: i64) {
        self.reset_at = reset_at;
    }

    /// Milliseconds to wait before the next request may be sent.
    ///
    /// Zero when the bucket has requests left and no global limit is active.
    pub fn time_till_space(&self, now: i64, global_reset: i64) -> i64 {
        if self.remaining > 0 && global_reset <= now {
            return 0;
        }
        (self.reset_at.max(global_reset) - now).max(0)
    }
}
