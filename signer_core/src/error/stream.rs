//! Stream protocol violations
//!
//! These are contract violations by a stage, not runtime conditions. They
//! surface as errors so tests and the orchestrator can flag them.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// `close` was called on a stream that was already closed
    #[error("Stream '{stream}' closed more than once")]
    DoubleClose { stream: String },

    /// A value was sent after the stream was closed
    #[error("Send on closed stream '{stream}'")]
    SendAfterClose { stream: String },

    /// The stream was closed while other writers still held handles
    #[error("Stream '{stream}' closed while {writers} other writer(s) were still active")]
    ClosedBeforeDrain { stream: String, writers: usize },

    /// A stage finished without closing its output
    #[error("Stream '{stream}' was never closed by its producer")]
    NeverClosed { stream: String },

    /// The reading side was dropped before the producer finished
    #[error("Stream '{stream}' has no reader")]
    Disconnected { stream: String },
}

impl StreamError {
    pub fn double_close(stream: &str) -> Self {
        Self::DoubleClose {
            stream: stream.to_string(),
        }
    }

    pub fn send_after_close(stream: &str) -> Self {
        Self::SendAfterClose {
            stream: stream.to_string(),
        }
    }

    pub fn closed_before_drain(stream: &str, writers: usize) -> Self {
        Self::ClosedBeforeDrain {
            stream: stream.to_string(),
            writers,
        }
    }

    pub fn never_closed(stream: &str) -> Self {
        Self::NeverClosed {
            stream: stream.to_string(),
        }
    }

    pub fn disconnected(stream: &str) -> Self {
        Self::Disconnected {
            stream: stream.to_string(),
        }
    }

    /// Name of the stream the violation happened on
    pub fn stream(&self) -> &str {
        match self {
            Self::DoubleClose { stream }
            | Self::SendAfterClose { stream }
            | Self::ClosedBeforeDrain { stream, .. }
            | Self::NeverClosed { stream }
            | Self::Disconnected { stream } => stream,
        }
    }
}
