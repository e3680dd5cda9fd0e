//! # cord-gateway
//!
//! Gateway side of the client: the WebSocket connection to Discord, the
//! packet handlers that keep the cache in sync, and the dispatcher that
//! delivers typed events to listeners.

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod protocol;

pub use broadcast::{listener_fn, EventDispatcher, EventDispatcherConfig, EventListener, ListenerId, ListenerManager};
pub use connection::{GatewayClient, GatewayConfig, GatewayHandle};
pub use error::{GatewayError, GatewayResult};
pub use handlers::{HandlerContext, HandlerRegistry, PacketHandler};
