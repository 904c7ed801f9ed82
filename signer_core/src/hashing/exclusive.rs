//! Injectable mutual-exclusion handle for scarce shared resources

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// A cloneable lock around a resource that admits one caller at a time
///
/// Clones share the same lock. Hand the same handle to every worker that
/// touches the resource; workers holding different handles do not exclude
/// each other.
#[derive(Clone, Debug)]
pub struct ExclusiveResource {
    name: Arc<str>,
    lock: Arc<Mutex<()>>,
    acquisitions: Arc<AtomicU64>,
}

/// Guard returned by [`ExclusiveResource::acquire`]; the resource is released on drop
#[derive(Debug)]
pub struct ExclusiveGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ExclusiveResource {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            lock: Arc::new(Mutex::new(())),
            acquisitions: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait until no other holder exists, then take the resource
    pub async fn acquire(&self) -> ExclusiveGuard<'_> {
        let guard = self.lock.lock().await;
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        ExclusiveGuard { _guard: guard }
    }

    /// Number of times the resource has been taken
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Whether two handles guard the same lock
    pub fn shares_lock_with(&self, other: &ExclusiveResource) -> bool {
        Arc::ptr_eq(&self.lock, &other.lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_clones_share_the_lock() {
        let resource = ExclusiveResource::new("secure-hash");
        let clone = resource.clone();
        assert!(resource.shares_lock_with(&clone));
        assert!(!resource.shares_lock_with(&ExclusiveResource::new("other")));

        let guard = resource.acquire().await;
        let blocked =
            tokio::time::timeout(Duration::from_millis(20), clone.acquire()).await;
        assert!(blocked.is_err(), "clone must wait while the guard is held");

        drop(guard);
        let _guard = clone.acquire().await;
        assert_eq!(resource.acquisitions(), 2);
    }
}
