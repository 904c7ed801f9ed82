//! Bounded streams connecting pipeline stages
//!
//! A stream is a bounded tokio channel plus shared bookkeeping that records
//! how many values went through it and how many times it was closed. The
//! writing half ([`Outbound`]) is cloneable so a stage can hand one copy to
//! each worker; the stage closes its own copy once every worker is done.

use super::{Value, check_limit};
use crate::Result;
use crate::error::StreamError;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc;

#[derive(Debug)]
struct StreamState {
    name: String,
    capacity: usize,
    sent: AtomicU64,
    closes: AtomicUsize,
    writers: AtomicUsize,
}

/// Writing half of a stream
#[derive(Debug)]
pub struct Outbound {
    tx: mpsc::Sender<Value>,
    state: Arc<StreamState>,
}

/// Reading half of a stream
#[derive(Debug)]
pub struct Inbound {
    rx: mpsc::Receiver<Value>,
    state: Arc<StreamState>,
}

/// Read-only view of a stream's bookkeeping, kept by whoever wired it
#[derive(Debug, Clone)]
pub struct StreamProbe {
    state: Arc<StreamState>,
}

/// Snapshot of a stream after (or during) a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamReport {
    pub name: String,
    pub capacity: usize,
    pub sent: u64,
    pub closed_count: usize,
}

/// Create a bounded stream holding at most `capacity` unread values
pub fn stream(name: impl Into<String>, capacity: usize) -> Result<(Outbound, Inbound)> {
    let name = name.into();
    check_limit("stream_capacity", capacity)?;

    let (tx, rx) = mpsc::channel(capacity);
    let state = Arc::new(StreamState {
        name,
        capacity,
        sent: AtomicU64::new(0),
        closes: AtomicUsize::new(0),
        writers: AtomicUsize::new(1),
    });

    Ok((
        Outbound {
            tx,
            state: Arc::clone(&state),
        },
        Inbound { rx, state },
    ))
}

impl Outbound {
    /// Send a value, waiting while the stream is full
    pub async fn send(&self, value: Value) -> Result<()> {
        if self.is_closed() {
            return Err(StreamError::send_after_close(self.name()).into());
        }

        self.tx
            .send(value)
            .await
            .map_err(|_| StreamError::disconnected(self.name()))?;
        self.state.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close the stream
    ///
    /// Must be called exactly once, by the producer, after every other
    /// writer handle has been dropped.
    pub fn close(self) -> Result<()> {
        let previous = self.state.closes.fetch_add(1, Ordering::SeqCst);
        if previous > 0 {
            return Err(StreamError::double_close(self.name()).into());
        }

        let others = self.state.writers.load(Ordering::SeqCst) - 1;
        if others > 0 {
            return Err(StreamError::closed_before_drain(self.name(), others).into());
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn is_closed(&self) -> bool {
        self.state.closes.load(Ordering::SeqCst) > 0
    }

    /// Number of values sent but not yet received
    pub fn buffered(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Number of live writer handles, this one included
    pub fn writers(&self) -> usize {
        self.state.writers.load(Ordering::SeqCst)
    }

    pub fn probe(&self) -> StreamProbe {
        StreamProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Clone for Outbound {
    fn clone(&self) -> Self {
        self.state.writers.fetch_add(1, Ordering::SeqCst);
        Self {
            tx: self.tx.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for Outbound {
    fn drop(&mut self) {
        self.state.writers.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Inbound {
    /// A stream that is already closed and empty
    pub fn closed(name: impl Into<String>) -> Result<Self> {
        let (outbound, inbound) = stream(name, 1)?;
        outbound.close()?;
        Ok(inbound)
    }

    /// Receive the next value; `None` once every writer is gone
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn probe(&self) -> StreamProbe {
        StreamProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl StreamProbe {
    pub fn report(&self) -> StreamReport {
        StreamReport {
            name: self.state.name.clone(),
            capacity: self.state.capacity,
            sent: self.state.sent.load(Ordering::Relaxed),
            closed_count: self.state.closes.load(Ordering::SeqCst),
        }
    }
}

impl StreamReport {
    /// Fails unless the stream was closed exactly once
    pub fn check(&self) -> Result<()> {
        match self.closed_count {
            1 => Ok(()),
            0 => Err(StreamError::never_closed(&self.name).into()),
            _ => Err(StreamError::double_close(&self.name).into()),
        }
    }
}
