//! Hash provider doubles for pipeline tests

use async_trait::async_trait;
use signer_core::error::InternalError;
use signer_core::{HashProvider, Result, SignerProvider};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Counts how many calls of each kind overlap
///
/// Wraps another provider (the real one by default) and records the peak
/// number of `secure_hash` and `chk` calls in flight at the same moment.
/// A `secure_hash` delay widens the window in which overlaps can happen.
#[derive(Debug)]
pub struct InstrumentedProvider {
    inner: Arc<dyn HashProvider>,
    secure_hash_delay: Duration,
    chk_delay: Duration,
    secure_active: AtomicUsize,
    secure_peak: AtomicUsize,
    secure_calls: AtomicUsize,
    chk_active: AtomicUsize,
    chk_peak: AtomicUsize,
}

struct Active<'a>(&'a AtomicUsize);

impl<'a> Active<'a> {
    fn enter(active: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for InstrumentedProvider {
    fn default() -> Self {
        Self::wrapping(Arc::new(SignerProvider::new()))
    }
}

impl InstrumentedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrapping(inner: Arc<dyn HashProvider>) -> Self {
        Self {
            inner,
            secure_hash_delay: Duration::ZERO,
            chk_delay: Duration::ZERO,
            secure_active: AtomicUsize::new(0),
            secure_peak: AtomicUsize::new(0),
            secure_calls: AtomicUsize::new(0),
            chk_active: AtomicUsize::new(0),
            chk_peak: AtomicUsize::new(0),
        }
    }

    pub fn with_secure_hash_delay(mut self, delay: Duration) -> Self {
        self.secure_hash_delay = delay;
        self
    }

    pub fn with_chk_delay(mut self, delay: Duration) -> Self {
        self.chk_delay = delay;
        self
    }

    /// Largest number of `secure_hash` calls ever in flight at once
    pub fn peak_secure_hash_concurrency(&self) -> usize {
        self.secure_peak.load(Ordering::SeqCst)
    }

    /// Largest number of `chk` calls ever in flight at once
    pub fn peak_chk_concurrency(&self) -> usize {
        self.chk_peak.load(Ordering::SeqCst)
    }

    pub fn secure_hash_calls(&self) -> usize {
        self.secure_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HashProvider for InstrumentedProvider {
    async fn chk(&self, data: &str) -> Result<String> {
        let _active = Active::enter(&self.chk_active, &self.chk_peak);
        if !self.chk_delay.is_zero() {
            tokio::time::sleep(self.chk_delay).await;
        }
        self.inner.chk(data).await
    }

    async fn secure_hash(&self, data: &str) -> Result<String> {
        self.secure_calls.fetch_add(1, Ordering::SeqCst);
        let _active = Active::enter(&self.secure_active, &self.secure_peak);
        if !self.secure_hash_delay.is_zero() {
            tokio::time::sleep(self.secure_hash_delay).await;
        }
        self.inner.secure_hash(data).await
    }
}

/// Delays `chk` calls whose input starts with a given prefix
///
/// Multi-hash lanes salt their input with the lane ordinal, so a prefix
/// delay makes chosen lanes finish last.
#[derive(Debug, Default)]
pub struct DelayedProvider {
    inner: SignerProvider,
    prefix_delays: Vec<(String, Duration)>,
}

impl DelayedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix_delay(mut self, prefix: &str, delay: Duration) -> Self {
        self.prefix_delays.push((prefix.to_string(), delay));
        self
    }

    fn delay_for(&self, data: &str) -> Duration {
        self.prefix_delays
            .iter()
            .filter(|(prefix, _)| data.starts_with(prefix.as_str()))
            .map(|(_, delay)| *delay)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl HashProvider for DelayedProvider {
    async fn chk(&self, data: &str) -> Result<String> {
        let delay = self.delay_for(data);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.inner.chk(data).await
    }

    async fn secure_hash(&self, data: &str) -> Result<String> {
        self.inner.secure_hash(data).await
    }
}

/// Fails on chosen inputs, succeeds like the real provider otherwise
#[derive(Debug, Default)]
pub struct FailingProvider {
    inner: SignerProvider,
    fail_chk: HashSet<String>,
    fail_secure_hash: HashSet<String>,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_chk_on(mut self, data: &str) -> Self {
        self.fail_chk.insert(data.to_string());
        self
    }

    pub fn fail_secure_hash_on(mut self, data: &str) -> Self {
        self.fail_secure_hash.insert(data.to_string());
        self
    }
}

#[async_trait]
impl HashProvider for FailingProvider {
    async fn chk(&self, data: &str) -> Result<String> {
        if self.fail_chk.contains(data) {
            return Err(InternalError::hash_calculation("CRC32", &format!("refused input {data:?}")).into());
        }
        self.inner.chk(data).await
    }

    async fn secure_hash(&self, data: &str) -> Result<String> {
        if self.fail_secure_hash.contains(data) {
            return Err(InternalError::hash_calculation("MD5", &format!("refused input {data:?}")).into());
        }
        self.inner.secure_hash(data).await
    }
}
