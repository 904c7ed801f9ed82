//! Signer Core Library
//!
//! A staged concurrent pipeline that turns a stream of integers into a
//! single deterministic digest. Integers are dual-hashed, then multi-hashed,
//! then sorted and joined, with bounded streams between the stages.

pub mod error;
pub mod hashing;
pub mod pipeline;

// Re-export main types
pub use error::{Error, Result};
pub use hashing::{
    ExclusiveResource, HashAlgorithm, HashProvider, ProviderStats, SignerProvider,
};
pub use pipeline::{
    CombineStage, CompletionBarrier, Inbound, MultiHashStage, Outbound, Pipeline, PipelineBuilder,
    PipelineOutcome, SingleHashStage, Stage, StreamReport, Value,
};

use serde::{Deserialize, Serialize};

/// Core pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Unread values each stream holds before its producer waits
    pub stream_capacity: usize,
    /// Per-stage cap on in-flight workers; unset means one worker per item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Simulated cost of one checksum call
    pub chk_delay_ms: u64,
    /// Simulated cost of one secure hash call
    pub secure_hash_delay_ms: u64,
    /// Extra cost paid by a secure hash call that overlaps another
    pub overheat_penalty_ms: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            stream_capacity: pipeline::DEFAULT_STREAM_CAPACITY,
            max_workers: None,
            chk_delay_ms: 0,
            secure_hash_delay_ms: 0,
            overheat_penalty_ms: 0,
        }
    }
}

impl SignerConfig {
    /// Configuration that makes the provider as slow as a rate-limited service
    pub fn simulated() -> Self {
        Self {
            chk_delay_ms: 1000,
            secure_hash_delay_ms: 10,
            overheat_penalty_ms: 1000,
            ..Self::default()
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        pipeline::check_limit("stream_capacity", self.stream_capacity)?;
        if let Some(limit) = self.max_workers {
            pipeline::check_limit("max_workers", limit)?;
        }
        Ok(())
    }
}
