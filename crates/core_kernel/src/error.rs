//! Kernel error type

use thiserror::Error;

use crate::money::MoneyError;
use crate::temporal::TemporalError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Date error: {0}")]
    Temporal(#[from] TemporalError),

    /// A status or kind code that is not one of the known values
    #[error("Unknown {kind} '{value}'")]
    UnknownCode { kind: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Environment or `.env` settings could not be read
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn unknown_code(kind: &'static str, value: impl Into<String>) -> Self {
        CoreError::UnknownCode {
            kind,
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(error: config::ConfigError) -> Self {
        CoreError::Configuration(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_code_message_names_kind_and_value() {
        let error = CoreError::unknown_code("payment status", "PAID?");
        assert_eq!(error.to_string(), "Unknown payment status 'PAID?'");
    }
}
