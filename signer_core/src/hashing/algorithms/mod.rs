//! Hash algorithm implementations

use super::registry::AlgorithmRegistry;

mod crc32;
mod md5;

/// Register all built-in algorithms with the registry
pub(crate) fn register_all(registry: &mut AlgorithmRegistry) {
    registry.register(crc32::Crc32Algorithm);
    registry.register(md5::Md5Algorithm);
}
