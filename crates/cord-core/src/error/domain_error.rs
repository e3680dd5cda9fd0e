//! Domain errors - validation failures raised before anything is sent to Discord

use thiserror::Error;

use crate::value_objects::SnowflakeParseError;

/// Domain layer errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // =========================================================================
    // Field Errors
    // =========================================================================
    #[error("{field} is too long: max {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("{field} is too short: min {min} characters")]
    FieldTooShort { field: &'static str, min: usize },

    #[error("{field} must not be empty")]
    FieldEmpty { field: &'static str },

    #[error("Too many {field}: max {max}")]
    TooManyItems { field: &'static str, max: usize },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    // =========================================================================
    // Value Errors
    // =========================================================================
    #[error("Invalid snowflake: {0}")]
    InvalidSnowflake(#[from] SnowflakeParseError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::FieldTooLong { .. } => "FIELD_TOO_LONG",
            Self::FieldTooShort { .. } => "FIELD_TOO_SHORT",
            Self::FieldEmpty { .. } => "FIELD_EMPTY",
            Self::TooManyItems { .. } => "TOO_MANY_ITEMS",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::InvalidSnowflake(_) => "INVALID_SNOWFLAKE",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Check a character count against an upper bound
    pub fn check_max_len(field: &'static str, value: &str, max: usize) -> Result<(), Self> {
        if value.chars().count() > max {
            return Err(Self::FieldTooLong { field, max });
        }
        Ok(())
    }

    /// Check a character count against inclusive bounds; empty is reported as such
    pub fn check_len(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), Self> {
        let len = value.chars().count();
        if len == 0 && min > 0 {
            return Err(Self::FieldEmpty { field });
        }
        if len < min {
            return Err(Self::FieldTooShort { field, min });
        }
        if len > max {
            return Err(Self::FieldTooLong { field, max });
        }
        Ok(())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
