//! Central registry for hash algorithm implementations

use super::traits::HashAlgorithmImpl;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Central registry for all hash algorithms
///
/// Populated once on first access and read-only afterwards.
pub struct AlgorithmRegistry {
    algorithms: HashMap<&'static str, Arc<dyn HashAlgorithmImpl>>,
}

impl AlgorithmRegistry {
    fn new() -> Self {
        Self {
            algorithms: HashMap::new(),
        }
    }

    /// Get the global registry instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceCell<AlgorithmRegistry> = OnceCell::new();
        INSTANCE.get_or_init(|| {
            let mut registry = Self::new();
            super::algorithms::register_all(&mut registry);
            registry
        })
    }

    /// Register a new algorithm
    pub(crate) fn register(&mut self, algorithm: impl HashAlgorithmImpl + 'static) {
        self.algorithms.insert(algorithm.id(), Arc::new(algorithm));
    }

    /// Get algorithm by ID
    pub fn get(&self, id: &str) -> Option<Arc<dyn HashAlgorithmImpl>> {
        self.algorithms.get(id).cloned()
    }

    /// List all registered algorithm IDs, sorted
    pub fn list(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.algorithms.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
