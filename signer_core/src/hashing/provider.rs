//! Hash provider trait and the default CRC32/MD5 implementation

use super::HashAlgorithm;
use crate::{Result, SignerConfig};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Source of the two digests the pipeline stages compute
///
/// Both methods are pure: the same input always yields the same digest.
/// `chk` may be called concurrently without limit. `secure_hash` is a scarce
/// resource and callers are expected to serialize access to it.
#[async_trait]
pub trait HashProvider: Send + Sync + Debug {
    /// Cheap checksum
    async fn chk(&self, data: &str) -> Result<String>;

    /// Expensive digest, one caller at a time
    async fn secure_hash(&self, data: &str) -> Result<String>;
}

/// Call counters reported by [`SignerProvider::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    pub chk_calls: u64,
    pub secure_hash_calls: u64,
    /// `secure_hash` calls that started while another was still running
    pub overheats: u64,
}

/// CRC32 checksum and MD5 secure hash, with optional simulated cost
///
/// With the delays set the provider behaves like a slow external service.
/// Overlapping `secure_hash` calls "overheat" it: the late caller pays
/// `overheat_penalty` on top of the normal delay, and the event is counted.
#[derive(Debug, Default)]
pub struct SignerProvider {
    chk_delay: Duration,
    secure_hash_delay: Duration,
    overheat_penalty: Duration,
    secure_in_flight: AtomicUsize,
    chk_calls: AtomicU64,
    secure_hash_calls: AtomicU64,
    overheats: AtomicU64,
}

/// Decrements the in-flight counter when a `secure_hash` call ends
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SignerProvider {
    /// Provider with no simulated cost
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new()
            .with_chk_delay(Duration::from_millis(config.chk_delay_ms))
            .with_secure_hash_delay(Duration::from_millis(config.secure_hash_delay_ms))
            .with_overheat_penalty(Duration::from_millis(config.overheat_penalty_ms))
    }

    pub fn with_chk_delay(mut self, delay: Duration) -> Self {
        self.chk_delay = delay;
        self
    }

    pub fn with_secure_hash_delay(mut self, delay: Duration) -> Self {
        self.secure_hash_delay = delay;
        self
    }

    pub fn with_overheat_penalty(mut self, penalty: Duration) -> Self {
        self.overheat_penalty = penalty;
        self
    }

    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            chk_calls: self.chk_calls.load(Ordering::Relaxed),
            secure_hash_calls: self.secure_hash_calls.load(Ordering::Relaxed),
            overheats: self.overheats.load(Ordering::Relaxed),
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl HashProvider for SignerProvider {
    async fn chk(&self, data: &str) -> Result<String> {
        self.chk_calls.fetch_add(1, Ordering::Relaxed);
        pause(self.chk_delay).await;
        Ok(HashAlgorithm::CRC32.digest(data))
    }

    async fn secure_hash(&self, data: &str) -> Result<String> {
        self.secure_hash_calls.fetch_add(1, Ordering::Relaxed);
        let active = self.secure_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.secure_in_flight);

        if active > 1 {
            self.overheats.fetch_add(1, Ordering::Relaxed);
            log::warn!("secure hash overheated: {active} calls in flight");
            pause(self.overheat_penalty).await;
        }

        pause(self.secure_hash_delay).await;
        Ok(HashAlgorithm::MD5.digest(data))
    }
}
