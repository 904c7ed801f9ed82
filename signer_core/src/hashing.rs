//! Hash provider for the signer pipeline
//!
//! Two digests are used: a cheap checksum (`chk`, CRC32) that may be called
//! concurrently without limit, and an expensive digest (`secure_hash`, MD5)
//! whose callers must serialize through an [`ExclusiveResource`].

use crate::{Error, Result, error::ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod algorithms;
mod exclusive;
mod provider;
mod registry;
mod traits;

pub use exclusive::{ExclusiveGuard, ExclusiveResource};
pub use provider::{HashProvider, ProviderStats, SignerProvider};
pub use registry::AlgorithmRegistry;
pub use traits::{HashAlgorithmExt, HashAlgorithmImpl, StreamingHasher};

/// Hash algorithms available to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// CRC32 (IEEE), rendered as unsigned decimal
    CRC32,
    /// MD5, rendered as lowercase hex
    MD5,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::CRC32 => write!(f, "crc32"),
            HashAlgorithm::MD5 => write!(f, "md5"),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "crc32" => Ok(HashAlgorithm::CRC32),
            "md5" => Ok(HashAlgorithm::MD5),
            _ => Err(Error::Validation(ValidationError::invalid_configuration(
                &format!("Unknown hash algorithm: {s}"),
            ))),
        }
    }
}

impl HashAlgorithmExt for HashAlgorithm {
    fn to_impl(&self) -> Arc<dyn HashAlgorithmImpl> {
        AlgorithmRegistry::global()
            .get(&self.to_string())
            .expect("built-in algorithms are always registered")
    }
}

impl HashAlgorithm {
    /// Digest a string with this algorithm
    pub fn digest(&self, data: &str) -> String {
        self.to_impl().hash_bytes(data.as_bytes())
    }
}
