//! Integration test utilities for cord
//!
//! Local stand-ins for Discord: an HTTP server playing the REST API and a
//! WebSocket server playing the gateway, plus JSON fixtures for both.

pub mod fixtures;
pub mod mock_gateway;
pub mod mock_rest;

pub use fixtures::*;
pub use mock_gateway::{Inbound, MockConnection, MockGateway};
pub use mock_rest::{MockRest, RecordedRequest};

use std::time::Duration;

/// Upper bound for anything a test waits on
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);
