//! Pipeline orchestration
//!
//! The orchestrator wires an ordered list of stages into a chain of bounded
//! streams, runs every stage as its own task and waits for all of them. It
//! never looks at the values flowing through.

use super::{
    CombineStage, Inbound, MultiHashStage, Outbound, PipelineConfig, SingleHashStage, Stage,
    StreamProbe, StreamReport, Value, check_limit, stream,
};
use crate::error::{InternalError, ValidationError};
use crate::hashing::{ExclusiveResource, HashProvider};
use crate::{Error, Result, SignerConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{AbortHandle, JoinSet};

/// An ordered chain of stages
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    config: PipelineConfig,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Values emitted by the last stage, in arrival order
    pub outputs: Vec<Value>,
    /// One report per stream, seed first
    pub streams: Vec<StreamReport>,
    pub duration: Duration,
}

impl PipelineOutcome {
    /// The sole text value of a run whose last stage emits exactly one
    pub fn single_output(&self) -> Result<&str> {
        match self.outputs.as_slice() {
            [value] => value.as_text().ok_or_else(|| {
                ValidationError::unexpected_value("pipeline output", "text", value.kind()).into()
            }),
            other => Err(ValidationError::invalid_parameter(
                "outputs",
                &format!("expected exactly one output, found {}", other.len()),
            )
            .into()),
        }
    }
}

/// Aborts a stage task if its supervisor goes away first
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Pipeline {
    /// The three-stage signer chain sharing one provider
    ///
    /// The chain gets a secure-hash lock of its own, so `secure_hash` calls
    /// are exclusive within this pipeline only. For process-wide exclusion
    /// build every pipeline with [`Pipeline::signer_with_lock`] and clones of
    /// one [`ExclusiveResource`].
    pub fn signer(config: &SignerConfig, provider: Arc<dyn HashProvider>) -> Result<Self> {
        Self::signer_with_lock(config, provider, ExclusiveResource::new("secure-hash"))
    }

    /// Like [`Pipeline::signer`], with the secure-hash lock supplied by the caller
    ///
    /// Pipelines built from clones of one lock never run `secure_hash`
    /// concurrently with each other.
    pub fn signer_with_lock(
        config: &SignerConfig,
        provider: Arc<dyn HashProvider>,
        secure_lock: ExclusiveResource,
    ) -> Result<Self> {
        config.validate()?;

        let single = SingleHashStage::new(Arc::clone(&provider))
            .with_lock(secure_lock)
            .with_max_workers(config.max_workers);
        let multi = MultiHashStage::new(provider).with_max_workers(config.max_workers);

        PipelineBuilder::with_config(PipelineConfig {
            stream_capacity: config.stream_capacity,
        })
        .add_stage(Box::new(single))
        .add_stage(Box::new(multi))
        .add_stage(Box::new(CombineStage::new()))
        .build()
    }

    /// Number of stages in the chain
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Get a reference to a specific stage by position
    pub fn stage(&self, position: usize) -> Option<&dyn Stage> {
        self.stages.get(position).map(|stage| stage.as_ref())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Feed `values` into the first stage, then run the chain to completion
    ///
    /// Fails without running when the first stage generates its own input;
    /// such chains are started with `execute(None)`.
    pub async fn run<I, V>(&self, values: I) -> Result<PipelineOutcome>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if let Some(first) = self.stages.first().filter(|stage| !stage.reads_input()) {
            return Err(ValidationError::invalid_configuration(&format!(
                "first stage '{}' generates its own input; start it with execute(None)",
                first.name()
            ))
            .into());
        }

        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let (seed_tx, seed_rx) = stream("seed", self.config.stream_capacity)?;

        let feeder = tokio::spawn(async move {
            for value in values {
                seed_tx.send(value).await?;
            }
            seed_tx.close()
        });
        let _feeder_guard = AbortOnDrop(feeder.abort_handle());

        let outcome = self.execute(Some(seed_rx)).await?;
        feeder
            .await
            .map_err(|e| InternalError::worker_panicked("seed", e.to_string()))??;
        Ok(outcome)
    }

    /// Run every stage concurrently and wait for the last one to finish
    ///
    /// Without a seed the first stage sees an input that is already closed.
    /// The first stage failure aborts the other stages and is returned; no
    /// partial output is reported.
    pub async fn execute(&self, seed: Option<Inbound>) -> Result<PipelineOutcome> {
        let started = Instant::now();

        let mut input = match seed {
            Some(seed) => seed,
            None => Inbound::closed("seed")?,
        };
        let mut probes: Vec<StreamProbe> = vec![input.probe()];
        let mut tasks = JoinSet::new();

        for (position, stage) in self.stages.iter().enumerate() {
            let (output, next_input) = stream(
                format!("{position}:{}", stage.name()),
                self.config.stream_capacity,
            )?;
            probes.push(output.probe());

            let stage_input = std::mem::replace(&mut input, next_input);
            let stage = Arc::clone(stage);
            tasks.spawn(supervise(position, stage, stage_input, output));
        }

        let mut last = input;
        let collect = async move {
            let mut outputs = Vec::new();
            while let Some(value) = last.recv().await {
                outputs.push(value);
            }
            outputs
        };
        let (outputs, finished) = tokio::join!(collect, join_stages(&mut tasks));
        finished?;

        let streams: Vec<StreamReport> = probes.iter().map(StreamProbe::report).collect();
        for report in &streams {
            report.check()?;
        }

        let duration = started.elapsed();
        log::debug!(
            "Pipeline finished {} stage(s) in {:?} with {} output(s)",
            self.stages.len(),
            duration,
            outputs.len()
        );

        Ok(PipelineOutcome {
            outputs,
            streams,
            duration,
        })
    }
}

/// Run one stage in its own task and tag any failure with its position
async fn supervise(
    position: usize,
    stage: Arc<dyn Stage>,
    input: Inbound,
    output: Outbound,
) -> Result<()> {
    let name = stage.name().to_string();
    log::debug!("Start stage {position}: {name}");

    let handle = tokio::spawn(async move { stage.run(input, output).await });
    let _guard = AbortOnDrop(handle.abort_handle());

    let result = match handle.await {
        Ok(result) => result,
        Err(join_err) => Err(InternalError::worker_panicked(&name, join_err.to_string()).into()),
    };

    match result {
        Ok(()) => {
            log::debug!("End stage {position}: {name}");
            Ok(())
        }
        Err(err) => {
            log::debug!("Stage {position}: {name} failed: {err}");
            Err(InternalError::stage_failed(position, &name, err).into())
        }
    }
}

async fn join_stages(tasks: &mut JoinSet<Result<()>>) -> Result<()> {
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| Error::from(InternalError::assertion(format!("stage supervisor lost: {e}"))))
            .and_then(|result| result);
        if let Err(err) = outcome {
            tasks.abort_all();
            return Err(err);
        }
    }
    Ok(())
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Create a new builder with custom config
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Append a stage to the chain
    pub fn add_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Set the capacity of every stream in the chain
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.config.stream_capacity = capacity;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(ValidationError::invalid_configuration(
                "a pipeline needs at least one stage",
            )
            .into());
        }
        check_limit("stream_capacity", self.config.stream_capacity)?;

        Ok(Pipeline {
            stages: self.stages.into_iter().map(Arc::from).collect(),
            config: self.config,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
