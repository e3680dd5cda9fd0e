//! # cord-cache
//!
//! In-memory cache of everything the gateway tells us about.
//!
//! ## Features
//!
//! - **Entity store**: `DashMap`s of `Arc` snapshots, replaced wholesale on every change
//! - **Message caches**: one bounded, id-ordered cache per channel
//! - **Permissions**: Discord's role and overwrite algorithm over cached state
//!
//! ## Example
//!
//! ```ignore
//! use cord_cache::Cache;
//!
//! let cache = Cache::new(50, 12 * 60 * 60);
//! cache.insert_server(server);
//! let roles = cache.server_roles(server_id);
//! let visible = cache.can_you_see(channel_id);
//! ```

pub mod messages;
pub mod store;

pub use messages::MessageCache;
pub use store::{Cache, SharedCache};
