//! Per-channel message caches

mod message_cache;

pub use message_cache::MessageCache;
