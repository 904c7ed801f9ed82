//! Test utilities for the signer pipeline
//!
//! This crate provides hash provider doubles and golden fixtures for
//! testing pipeline behavior.

pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use mocks::{DelayedProvider, FailingProvider, InstrumentedProvider};
