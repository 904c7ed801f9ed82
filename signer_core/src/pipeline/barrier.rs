//! Completion barrier for fan-out / fan-in stages
//!
//! A stage spawns one worker per input through the barrier and waits on it
//! before closing its output. `wait` returns only when every spawned worker
//! has finished, so no result is lost and the output is never closed early.

use super::check_limit;
use crate::Result;
use crate::error::InternalError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Counter-and-wait latch over a set of spawned workers
///
/// The first failing worker aborts the rest; that failure is what `spawn`
/// or `wait` returns. With a bound, `spawn` waits for a free slot before
/// starting the next worker, which pushes back on the stage's input loop.
pub struct CompletionBarrier<T = ()> {
    stage: String,
    tasks: JoinSet<Result<T>>,
    permits: Option<Arc<Semaphore>>,
    completed: Vec<T>,
    spawned: usize,
}

impl<T: Send + 'static> CompletionBarrier<T> {
    /// Barrier that starts every worker immediately
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            tasks: JoinSet::new(),
            permits: None,
            completed: Vec::new(),
            spawned: 0,
        }
    }

    /// Barrier that keeps at most `max_in_flight` workers running
    pub fn bounded(stage: &str, max_in_flight: usize) -> Result<Self> {
        check_limit("max_workers", max_in_flight)?;

        let mut barrier = Self::new(stage);
        barrier.permits = Some(Arc::new(Semaphore::new(max_in_flight)));
        Ok(barrier)
    }

    /// Unbounded for `None`, bounded otherwise
    pub fn with_limit(stage: &str, max_in_flight: Option<usize>) -> Result<Self> {
        match max_in_flight {
            Some(limit) => Self::bounded(stage, limit),
            None => Ok(Self::new(stage)),
        }
    }

    /// Start a worker and count it
    pub async fn spawn<F>(&mut self, worker: F) -> Result<()>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        self.reap()?;

        match &self.permits {
            Some(permits) => {
                let permit = Arc::clone(permits).acquire_owned().await.map_err(|_| {
                    InternalError::assertion(format!("worker slots of '{}' closed", self.stage))
                })?;
                self.tasks.spawn(async move {
                    let _permit = permit;
                    worker.await
                });
            }
            None => {
                self.tasks.spawn(worker);
            }
        }

        self.spawned += 1;
        Ok(())
    }

    /// Wait for every spawned worker, returning results in completion order
    pub async fn wait(mut self) -> Result<Vec<T>> {
        while let Some(joined) = self.tasks.join_next().await {
            let value = self.settle(joined)?;
            self.completed.push(value);
        }

        log::debug!(
            "Stage '{}' joined {} worker(s)",
            self.stage,
            self.completed.len()
        );
        Ok(self.completed)
    }

    /// Workers spawned so far
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Workers spawned and not yet joined
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Collect already finished workers so failures surface early
    fn reap(&mut self) -> Result<()> {
        while let Some(joined) = self.tasks.try_join_next() {
            let value = self.settle(joined)?;
            self.completed.push(value);
        }
        Ok(())
    }

    fn settle(&mut self, joined: std::result::Result<Result<T>, JoinError>) -> Result<T> {
        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                self.tasks.abort_all();
                Err(err)
            }
            Err(join_err) => {
                self.tasks.abort_all();
                Err(InternalError::worker_panicked(&self.stage, join_err.to_string()).into())
            }
        }
    }
}

impl<T> std::fmt::Debug for CompletionBarrier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionBarrier")
            .field("stage", &self.stage)
            .field("spawned", &self.spawned)
            .field("in_flight", &self.tasks.len())
            .field("bounded", &self.permits.is_some())
            .finish()
    }
}
