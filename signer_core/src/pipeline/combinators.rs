//! Small stages for building ad-hoc pipelines
//!
//! `SourceStage` generates values instead of reading them, for pipelines
//! started without a seed stream. `FnStage` turns an async closure into a
//! stage.

use super::{Inbound, Outbound, Stage, Value};
use crate::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;

/// A stage that ignores its input and emits a fixed list of values
#[derive(Debug, Clone)]
pub struct SourceStage {
    values: Vec<Value>,
}

impl SourceStage {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Stage for SourceStage {
    fn name(&self) -> &str {
        "Source"
    }

    fn reads_input(&self) -> bool {
        false
    }

    async fn run(&self, input: Inbound, output: Outbound) -> Result<()> {
        drop(input);
        for value in &self.values {
            output.send(value.clone()).await?;
        }
        output.close()
    }
}

/// A stage backed by an async closure
pub struct FnStage<F> {
    name: String,
    body: F,
}

impl<F> Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

impl<F, Fut> FnStage<F>
where
    F: Fn(Inbound, Outbound) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    pub fn new(name: &str, body: F) -> Self {
        Self {
            name: name.to_string(),
            body,
        }
    }
}

#[async_trait]
impl<F, Fut> Stage for FnStage<F>
where
    F: Fn(Inbound, Outbound) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: Inbound, output: Outbound) -> Result<()> {
        (self.body)(input, output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stream;

    #[tokio::test]
    async fn test_source_emits_values_in_order() {
        let source = SourceStage::new([3i64, 1, 2]);
        let (out_tx, mut out_rx) = stream("out", 4).unwrap();

        source
            .run(Inbound::closed("seed").unwrap(), out_tx)
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Some(value) = out_rx.recv().await {
            seen.push(value);
        }
        assert_eq!(seen, vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert!(!source.reads_input());
    }

    #[tokio::test]
    async fn test_fn_stage_runs_closure() {
        let doubler = FnStage::new("Double", |mut input: Inbound, output: Outbound| async move {
            while let Some(value) = input.recv().await {
                let n = value.into_int("Double")?;
                output.send(Value::Int(n * 2)).await?;
            }
            output.close()
        });
        assert_eq!(doubler.name(), "Double");

        let (seed_tx, seed_rx) = stream("seed", 4).unwrap();
        let (out_tx, mut out_rx) = stream("out", 4).unwrap();
        seed_tx.send(Value::Int(21)).await.unwrap();
        seed_tx.close().unwrap();

        doubler.run(seed_rx, out_tx).await.unwrap();
        assert_eq!(out_rx.recv().await, Some(Value::Int(42)));
    }
}
