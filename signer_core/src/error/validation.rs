//! Validation related error types

use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// A value of the wrong kind reached a stage
    #[error("Stage '{stage}' expected {expected} value, found {found}")]
    UnexpectedValue {
        stage: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an unexpected value error
    pub fn unexpected_value(stage: &str, expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedValue {
            stage: stage.to_string(),
            expected,
            found,
        }
    }
}
