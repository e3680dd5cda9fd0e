//! Facade error type

use cord_common::ConfigError;
use cord_core::DomainError;
use cord_gateway::GatewayError;
use cord_rest::RestError;
use thiserror::Error;

/// Anything that can go wrong while logging in or calling the API
#[derive(Debug, Error)]
pub enum Error {
    #[error("A token is required to log in")]
    MissingToken,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Rest(#[from] RestError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Discord answered with something that does not describe the entity asked for
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(&'static str),
}

impl Error {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::Config(e) => e.code(),
            Self::Domain(e) => e.code(),
            Self::Rest(e) => e.code(),
            Self::Gateway(e) => e.code(),
            Self::UnexpectedResponse(_) => "UNEXPECTED_RESPONSE",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
