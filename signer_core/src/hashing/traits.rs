//! Core traits for the hash algorithm extensibility system

use std::sync::Arc;

/// Core trait that all hash algorithms must implement
pub trait HashAlgorithmImpl: Send + Sync {
    /// Unique identifier for this algorithm
    fn id(&self) -> &'static str;

    /// Display name for user interfaces
    fn display_name(&self) -> &'static str;

    /// Create a new streaming hasher instance
    fn create_hasher(&self) -> Box<dyn StreamingHasher>;

    /// Calculate the digest of in-memory data
    fn hash_bytes(&self, data: &[u8]) -> String {
        let mut hasher = self.create_hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Trait for streaming hash calculation
pub trait StreamingHasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash calculation and return the rendered digest
    fn finalize(self: Box<Self>) -> String;
}

/// Extension trait for the HashAlgorithm enum to reach its implementation
pub trait HashAlgorithmExt {
    /// Convert enum to trait implementation
    fn to_impl(&self) -> Arc<dyn HashAlgorithmImpl>;
}
