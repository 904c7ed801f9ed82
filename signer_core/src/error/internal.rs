//! Internal library error types

use thiserror::Error;

/// Internal pipeline errors
///
/// Every variant is fatal for the run it occurs in: the pipeline has no
/// retry or skip path.
#[derive(Error, Debug)]
pub enum InternalError {
    /// Hash provider failure
    #[error("Hash calculation failed for algorithm '{algorithm}': {message}")]
    HashCalculation { algorithm: String, message: String },

    /// A spawned worker panicked or was cancelled
    #[error("Worker in stage '{stage}' did not complete: {message}")]
    WorkerPanicked { stage: String, message: String },

    /// A stage returned an error, aborting the pipeline
    #[error("Stage {position} '{stage}' failed: {source}")]
    StageFailed {
        position: usize,
        stage: String,
        #[source]
        source: Box<crate::Error>,
    },

    /// Internal assertion failure
    #[error("Internal assertion failed: {message}")]
    Assertion { message: String },
}

impl InternalError {
    /// Create a hash calculation error
    pub fn hash_calculation(algorithm: &str, message: &str) -> Self {
        Self::HashCalculation {
            algorithm: algorithm.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a worker failure error
    pub fn worker_panicked(stage: &str, message: impl Into<String>) -> Self {
        Self::WorkerPanicked {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Wrap a stage error with its chain position
    pub fn stage_failed(position: usize, stage: &str, source: crate::Error) -> Self {
        Self::StageFailed {
            position,
            stage: stage.to_string(),
            source: Box::new(source),
        }
    }

    /// Create an internal assertion failure error
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }
}
