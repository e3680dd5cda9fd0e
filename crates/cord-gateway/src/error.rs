//! Gateway error types

use cord_rest::RestError;
use thiserror::Error;

use crate::protocol::CloseCode;

/// Errors that end a gateway session or the whole connection loop
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to fetch the gateway url: {0}")]
    Rest(#[from] RestError),

    #[error("Invalid gateway frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    #[error("Expected HELLO, got op {0}")]
    MissingHello(u8),

    /// A close that reconnecting cannot fix
    #[error("Connection closed: {0}")]
    Closed(CloseCode),

    #[error("Connection closed with unknown code {code}: {reason}")]
    ClosedUnknown { code: u16, reason: String },

    #[error("Not connected")]
    NotConnected,

    #[error("Gateway was stopped")]
    Stopped,
}

impl GatewayError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::WebSocket(_) => "WEBSOCKET_ERROR",
            Self::Rest(e) => e.code(),
            Self::InvalidFrame(_) => "INVALID_FRAME",
            Self::MissingHello(_) => "MISSING_HELLO",
            Self::Closed(CloseCode::AuthenticationFailed) => "AUTHENTICATION_FAILED",
            Self::Closed(CloseCode::DisallowedIntents) => "DISALLOWED_INTENTS",
            Self::Closed(_) | Self::ClosedUnknown { .. } => "CONNECTION_CLOSED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Stopped => "STOPPED",
        }
    }

    /// Whether the reconnect loop should try again
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Closed(code) => code.should_reconnect(),
            Self::Stopped => false,
            Self::Rest(RestError::Unauthorized) => false,
            _ => true,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(!GatewayError::Closed(CloseCode::AuthenticationFailed).is_recoverable());
        assert!(!GatewayError::Closed(CloseCode::InvalidIntents).is_recoverable());
        assert!(GatewayError::Closed(CloseCode::SessionTimeout).is_recoverable());
        assert!(GatewayError::NotConnected.is_recoverable());
        assert!(!GatewayError::Stopped.is_recoverable());
        assert!(!GatewayError::Rest(RestError::Unauthorized).is_recoverable());
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            GatewayError::Closed(CloseCode::AuthenticationFailed).code(),
            "AUTHENTICATION_FAILED"
        );
        assert_eq!(GatewayError::Rest(RestError::Unauthorized).code(), "UNAUTHORIZED");
        assert_eq!(GatewayError::MissingHello(0).code(), "MISSING_HELLO");
    }
}
