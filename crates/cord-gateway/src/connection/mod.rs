//! Gateway connection
//!
//! Connecting, heartbeating, identifying and resuming.

mod client;
mod config;
mod heartbeat;
mod session;

pub use client::{GatewayClient, GatewayHandle};
pub use config::GatewayConfig;
pub use session::SessionState;

use crate::protocol::{CloseCode, GatewayMessage};

/// Work for the writer task of a connection
#[derive(Debug)]
pub(crate) enum Outgoing {
    /// Rate limited frame
    Frame(GatewayMessage),
    /// Heartbeat with the latest sequence number
    Heartbeat,
    /// Send a close frame and stop writing
    Close(CloseCode),
}
