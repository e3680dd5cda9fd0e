//! Event broadcasting
//!
//! Listener registry and the per-server dispatch queues.

mod dispatcher;
mod listener;

pub use dispatcher::{EventDispatcher, EventDispatcherConfig, ListenerTimeouts};
pub use listener::{listener_fn, EventListener, FnListener, ListenerId, ListenerManager};
