//! Rate limiting
//!
//! Buckets track what Discord announces in its response headers; the
//! manager serializes requests per bucket and caps global throughput.

mod bucket;
mod headers;
mod manager;

pub use bucket::{BucketKey, RatelimitBucket};
pub use headers::RatelimitHeaders;
pub use manager::RatelimitManager;
