//! Handler error types

use thiserror::Error;

/// Handler error type
///
/// Handler errors never end the session: the packet is logged and skipped.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Payload did not match the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// A field the handler cannot work without was absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl HandlerError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::MissingField(_) => "MISSING_FIELD",
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
