//! Per-item multi hash stage

use super::{CompletionBarrier, Inbound, Outbound, Stage, Value};
use crate::error::InternalError;
use crate::{Error, Result};
use crate::hashing::HashProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// Number of salted checksums computed for each input
pub const MULTI_HASH_FANOUT: usize = 6;

/// Turns every string `s` into `chk("0"+s) chk("1"+s) ... chk("5"+s)`
///
/// Each worker fans out into [`MULTI_HASH_FANOUT`] lanes. Lane `i` writes
/// into slot `i` of the worker's buffer and the slots are concatenated in
/// index order, so lane completion order never shows in the output.
#[derive(Debug)]
pub struct MultiHashStage {
    provider: Arc<dyn HashProvider>,
    max_workers: Option<usize>,
}

impl MultiHashStage {
    pub fn new(provider: Arc<dyn HashProvider>) -> Self {
        Self {
            provider,
            max_workers: None,
        }
    }

    /// Keep at most `limit` workers in flight
    pub fn with_max_workers(mut self, limit: Option<usize>) -> Self {
        self.max_workers = limit;
        self
    }
}

/// Compute the ordinal-ordered salted checksums of a single value
pub(crate) async fn multi_hash(provider: Arc<dyn HashProvider>, data: Arc<str>) -> Result<String> {
    let mut lanes = CompletionBarrier::new("MultiHash");
    for ordinal in 0..MULTI_HASH_FANOUT {
        let provider = Arc::clone(&provider);
        let data = Arc::clone(&data);
        lanes
            .spawn(async move {
                let digest = provider.chk(&format!("{ordinal}{data}")).await?;
                Ok::<_, Error>((ordinal, digest))
            })
            .await?;
    }

    let mut slots: [Option<String>; MULTI_HASH_FANOUT] = Default::default();
    for (ordinal, digest) in lanes.wait().await? {
        slots[ordinal] = Some(digest);
    }

    let mut combined = String::new();
    for (ordinal, slot) in slots.into_iter().enumerate() {
        let digest = slot.ok_or_else(|| {
            InternalError::assertion(format!("multi hash lane {ordinal} produced no digest"))
        })?;
        combined.push_str(&digest);
    }
    Ok(combined)
}

#[async_trait]
impl Stage for MultiHashStage {
    fn name(&self) -> &str {
        "MultiHash"
    }

    async fn run(&self, mut input: Inbound, output: Outbound) -> Result<()> {
        let mut barrier = CompletionBarrier::with_limit(self.name(), self.max_workers)?;

        while let Some(value) = input.recv().await {
            let data: Arc<str> = Arc::from(value.into_text(self.name())?);
            let provider = Arc::clone(&self.provider);
            let output = output.clone();

            barrier
                .spawn(async move {
                    let combined = multi_hash(provider, data).await?;
                    output.send(Value::Text(combined)).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{HashAlgorithm, SignerProvider};
    use crate::pipeline::stream;

    #[tokio::test]
    async fn test_multi_hash_known_value() {
        let provider: Arc<dyn HashProvider> = Arc::new(SignerProvider::new());
        let combined = multi_hash(provider, Arc::from("4108050209~502633748"))
            .await
            .unwrap();
        assert_eq!(
            combined,
            "29568666068035183841425683795340791879727309630931025356555"
        );
    }

    #[tokio::test]
    async fn test_lanes_are_concatenated_by_ordinal() {
        let provider: Arc<dyn HashProvider> = Arc::new(SignerProvider::new());
        let combined = multi_hash(provider, Arc::from("abc")).await.unwrap();

        let expected: String = (0..MULTI_HASH_FANOUT)
            .map(|i| HashAlgorithm::CRC32.digest(&format!("{i}abc")))
            .collect();
        assert_eq!(combined, expected);
    }

    #[tokio::test]
    async fn test_stage_emits_one_value_per_input() {
        let stage = MultiHashStage::new(Arc::new(SignerProvider::new())).with_max_workers(Some(2));
        let (seed_tx, seed_rx) = stream("seed", 8).unwrap();
        let (out_tx, mut out_rx) = stream("out", 8).unwrap();

        for s in ["a", "b", "c", "d"] {
            seed_tx.send(Value::from(s)).await.unwrap();
        }
        seed_tx.close().unwrap();
        stage.run(seed_rx, out_tx).await.unwrap();

        let mut count = 0;
        while out_rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_integer_input_is_rejected() {
        let stage = MultiHashStage::new(Arc::new(SignerProvider::new()));
        let (seed_tx, seed_rx) = stream("seed", 2).unwrap();
        let (out_tx, _out_rx) = stream("out", 2).unwrap();

        seed_tx.send(Value::Int(3)).await.unwrap();
        seed_tx.close().unwrap();

        let err = stage.run(seed_rx, out_tx).await.unwrap_err();
        assert!(err.to_string().contains("expected text"));
    }
}
