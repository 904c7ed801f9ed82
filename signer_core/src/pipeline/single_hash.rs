//! Per-item dual hash stage

use super::{CompletionBarrier, Inbound, Outbound, Stage, Value};
use crate::Result;
use crate::hashing::{ExclusiveResource, HashProvider};
use async_trait::async_trait;
use std::sync::Arc;

/// Joins the plain and the secured checksum of one input
pub const SINGLE_HASH_SEPARATOR: &str = "~";

/// Turns every integer `x` into `chk(x) ~ chk(secure_hash(x))`
///
/// One worker per input. The two checksums of a worker run concurrently;
/// the `secure_hash` call goes through the stage's [`ExclusiveResource`] so
/// at most one is in flight across all workers sharing that lock. Output
/// order across inputs is unspecified.
#[derive(Debug)]
pub struct SingleHashStage {
    provider: Arc<dyn HashProvider>,
    secure_lock: ExclusiveResource,
    max_workers: Option<usize>,
}

impl SingleHashStage {
    pub fn new(provider: Arc<dyn HashProvider>) -> Self {
        Self {
            provider,
            secure_lock: ExclusiveResource::new("secure-hash"),
            max_workers: None,
        }
    }

    /// Share a secure-hash lock with other stages or callers
    pub fn with_lock(mut self, lock: ExclusiveResource) -> Self {
        self.secure_lock = lock;
        self
    }

    /// Keep at most `limit` workers in flight
    pub fn with_max_workers(mut self, limit: Option<usize>) -> Self {
        self.max_workers = limit;
        self
    }

    pub fn lock(&self) -> &ExclusiveResource {
        &self.secure_lock
    }
}

/// Compute the dual hash of a single value
pub(crate) async fn sign(
    provider: &dyn HashProvider,
    secure_lock: &ExclusiveResource,
    value: i64,
) -> Result<String> {
    let data = value.to_string();

    let (plain, secured) = tokio::try_join!(provider.chk(&data), async {
        let digest = {
            let _guard = secure_lock.acquire().await;
            provider.secure_hash(&data).await?
        };
        provider.chk(&digest).await
    })?;

    Ok(format!("{plain}{SINGLE_HASH_SEPARATOR}{secured}"))
}

#[async_trait]
impl Stage for SingleHashStage {
    fn name(&self) -> &str {
        "SingleHash"
    }

    async fn run(&self, mut input: Inbound, output: Outbound) -> Result<()> {
        let mut barrier = CompletionBarrier::with_limit(self.name(), self.max_workers)?;

        while let Some(value) = input.recv().await {
            let value = value.into_int(self.name())?;
            let provider = Arc::clone(&self.provider);
            let secure_lock = self.secure_lock.clone();
            let output = output.clone();

            barrier
                .spawn(async move {
                    let signed = sign(provider.as_ref(), &secure_lock, value).await?;
                    output.send(Value::Text(signed)).await
                })
                .await?;
        }

        log::debug!(
            "{}: input closed after {} value(s), draining",
            self.name(),
            barrier.spawned()
        );
        barrier.wait().await?;
        output.close()
    }
}
