//! Error types for the signer core library
//!
//! Errors are organized into logical categories. None of them is recoverable
//! inside a pipeline run: any error terminates the run.

use thiserror::Error;

pub mod internal;
pub mod stream;
pub mod validation;

pub use self::stream::StreamError;
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the signer core library
///
/// Errors are categorized into three main types:
/// - Validation errors: configuration and malformed values
/// - Internal errors: hash provider failures, worker and stage failures
/// - Stream errors: stream protocol violations by a stage
#[derive(Error, Debug)]
pub enum Error {
    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// Stream protocol violations
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl Error {
    /// Peel off stage wrappers to reach the error that started the failure
    pub fn root(&self) -> &Error {
        match self {
            Error::Internal(InternalError::StageFailed { source, .. }) => source.root(),
            other => other,
        }
    }
}
