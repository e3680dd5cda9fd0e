//! Events dispatched to listeners after a gateway packet updated the cache

mod change;
mod event;
mod scope;

pub use change::Change;
pub use event::*;
pub use scope::ListenerScope;
