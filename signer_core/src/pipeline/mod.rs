//! Staged concurrent pipeline
//!
//! A pipeline is an ordered chain of stages connected by bounded streams.
//! Each stage runs as its own task, reads its input stream to the end and
//! closes its output stream when it is done. The signer chain is
//! [`SingleHashStage`] → [`MultiHashStage`] → [`CombineStage`].

use crate::Result;
use crate::error::ValidationError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

mod barrier;
mod combinators;
mod combine;
mod executor;
mod multi_hash;
mod single_hash;
mod stream;

pub use barrier::CompletionBarrier;
pub use combinators::{FnStage, SourceStage};
pub use combine::{COMBINE_SEPARATOR, CombineStage};
pub use executor::{Pipeline, PipelineBuilder, PipelineOutcome};
pub use multi_hash::{MULTI_HASH_FANOUT, MultiHashStage};
pub use single_hash::{SINGLE_HASH_SEPARATOR, SingleHashStage};
pub use stream::{Inbound, Outbound, StreamProbe, StreamReport, stream};

/// Default number of unread values a stream can hold
pub const DEFAULT_STREAM_CAPACITY: usize = 20;

/// Largest stream capacity or worker limit tokio can hand out permits for
pub const MAX_LIMIT: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Reject a capacity or worker limit outside `1..=MAX_LIMIT`
pub(crate) fn check_limit(parameter: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ValidationError::invalid_parameter(parameter, "must be at least 1").into());
    }
    if value > MAX_LIMIT {
        return Err(ValidationError::invalid_parameter(
            parameter,
            &format!("must be at most {MAX_LIMIT}, got {value}"),
        )
        .into());
    }
    Ok(())
}

/// A unit of data travelling between stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Text(_) => "text",
        }
    }

    /// Take the integer out, or fail naming the stage that received it
    pub fn into_int(self, stage: &str) -> Result<i64> {
        match self {
            Value::Int(value) => Ok(value),
            other => Err(ValidationError::unexpected_value(stage, "integer", other.kind()).into()),
        }
    }

    /// Take the string out, or fail naming the stage that received it
    pub fn into_text(self, stage: &str) -> Result<String> {
        match self {
            Value::Text(value) => Ok(value),
            other => Err(ValidationError::unexpected_value(stage, "text", other.kind()).into()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            Value::Int(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
        }
    }
}

/// One position in a pipeline
///
/// A stage consumes its whole input and owns closing its output. It never
/// closes its input. It must call [`Outbound::close`] only after every value
/// it started work on has been sent.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Name of this stage for logging and error reports
    fn name(&self) -> &str;

    /// Whether the stage consumes its input stream
    ///
    /// A stage that generates its own values returns `false` and can only
    /// start a chain that is executed without a seed.
    fn reads_input(&self) -> bool {
        true
    }

    /// Run the stage to completion
    async fn run(&self, input: Inbound, output: Outbound) -> Result<()>;
}

/// Configuration for pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Unread values each stream can hold before its producer waits
    pub stream_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}
