//! Signer CLI library
//!
//! Configuration loading and output rendering for the `signer` binary.

pub mod config;
pub mod output;

/// Inputs used when `signer run` is given no values
pub const DEFAULT_INPUTS: [i64; 6] = [0, 1, 2, 3, 4, 5];
