//! REST errors
//!
//! Discord answers failed requests with a JSON body carrying a numeric
//! `code`. That code is the most precise information available, so it is
//! mapped first; the HTTP status is only the fallback.

use std::time::Duration;

use cord_core::DomainError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Known JSON error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestErrorCode {
    UnknownChannel,
    UnknownServer,
    UnknownMember,
    UnknownMessage,
    UnknownRole,
    UnknownUser,
    UnknownEmoji,
    UnknownScheduledEvent,
    MaximumRoles,
    MaximumEmojis,
    MissingAccess,
    MissingPermissions,
    InvalidFormBody,
    Other(u32),
}

impl RestErrorCode {
    pub fn from_code(code: u32) -> Self {
        match code {
            10003 => Self::UnknownChannel,
            10004 => Self::UnknownServer,
            10007 => Self::UnknownMember,
            10008 => Self::UnknownMessage,
            10011 => Self::UnknownRole,
            10013 => Self::UnknownUser,
            10014 => Self::UnknownEmoji,
            10070 => Self::UnknownScheduledEvent,
            30005 => Self::MaximumRoles,
            30008 => Self::MaximumEmojis,
            50001 => Self::MissingAccess,
            50013 => Self::MissingPermissions,
            50035 => Self::InvalidFormBody,
            other => Self::Other(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::UnknownChannel => 10003,
            Self::UnknownServer => 10004,
            Self::UnknownMember => 10007,
            Self::UnknownMessage => 10008,
            Self::UnknownRole => 10011,
            Self::UnknownUser => 10013,
            Self::UnknownEmoji => 10014,
            Self::UnknownScheduledEvent => 10070,
            Self::MaximumRoles => 30005,
            Self::MaximumEmojis => 30008,
            Self::MissingAccess => 50001,
            Self::MissingPermissions => 50013,
            Self::InvalidFormBody => 50035,
            Self::Other(other) => other,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::UnknownChannel => "Unknown channel",
            Self::UnknownServer => "Unknown guild",
            Self::UnknownMember => "Unknown member",
            Self::UnknownMessage => "Unknown message",
            Self::UnknownRole => "Unknown role",
            Self::UnknownUser => "Unknown user",
            Self::UnknownEmoji => "Unknown emoji",
            Self::UnknownScheduledEvent => "Unknown guild scheduled event",
            Self::MaximumRoles => "Maximum number of guild roles reached (250)",
            Self::MaximumEmojis => "Maximum number of emojis reached",
            Self::MissingAccess => "Missing access",
            Self::MissingPermissions => "You lack permissions to perform that action",
            Self::InvalidFormBody => "Invalid form body",
            Self::Other(_) => "Unrecognized error code",
        }
    }
}

/// REST layer errors
#[derive(Debug, Error)]
pub enum RestError {
    // =========================================================================
    // Discord Errors
    // =========================================================================
    #[error("Discord error {} ({status}): {message}", .code.as_u32())]
    Discord {
        status: StatusCode,
        code: RestErrorCode,
        message: String,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: invalid token")]
    Unauthorized,

    #[error("Missing permissions: {0}")]
    MissingPermissions(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Gateway unavailable (502)")]
    GatewayUnavailable,

    #[error("Discord server error ({status})")]
    Server { status: StatusCode },

    #[error("Unexpected status {status}")]
    UnexpectedStatus { status: StatusCode },

    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Domain(#[from] DomainError),
}

impl RestError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Discord { .. } => "DISCORD_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::MissingPermissions(_) => "MISSING_PERMISSIONS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::GatewayUnavailable => "GATEWAY_UNAVAILABLE",
            Self::Server { .. } => "SERVER_ERROR",
            Self::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            Self::Http(_) => "HTTP_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Map a failed response.
    ///
    /// A non-zero JSON `code` wins over the status code.
    pub fn from_response(status: StatusCode, body: Option<&Value>) -> Self {
        let message = body
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let json_code = body
            .and_then(|body| body.get("code"))
            .and_then(Value::as_u64)
            .and_then(|code| u32::try_from(code).ok())
            .filter(|code| *code != 0);
        if let Some(code) = json_code {
            return Self::Discord {
                status,
                code: RestErrorCode::from_code(code),
                message,
            };
        }

        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized,
            403 => Self::MissingPermissions(message),
            404 => Self::NotFound(message),
            405 => Self::MethodNotAllowed,
            429 => Self::RateLimited {
                retry_after: retry_after(body).unwrap_or_default(),
            },
            502 => Self::GatewayUnavailable,
            500..=599 => Self::Server { status },
            _ => Self::UnexpectedStatus { status },
        }
    }

    /// The Discord error code, if the response carried one
    pub fn discord_code(&self) -> Option<RestErrorCode> {
        match self {
            Self::Discord { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the error means the addressed resource does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Discord { code, status, .. } => {
                *status == StatusCode::NOT_FOUND
                    || (10_000..11_000).contains(&code.as_u32())
            }
            _ => false,
        }
    }
}

/// `retry_after` of a 429 body, in seconds with a fraction
pub(crate) fn retry_after(body: Option<&Value>) -> Option<Duration> {
    body.and_then(|body| body.get("retry_after"))
        .and_then(Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

pub type RestResult<T> = Result<T, RestError>;
