//! Mock implementations for testing

mod provider;

pub use provider::{DelayedProvider, FailingProvider, InstrumentedProvider};
