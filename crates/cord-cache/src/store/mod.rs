//! Entity store and permission computation

mod entity_cache;
mod permissions;

pub use entity_cache::{Cache, SharedCache};
