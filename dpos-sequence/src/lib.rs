// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Serialized task queues.
//!
//! A `Sequence` runs the tasks submitted to it one at a time, in submission order, on a
//! dedicated thread. Each mutation domain of the node (blocks, balances, storage) owns one,
//! which gives at most one in-flight mutation per domain without sharing locks across domains.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod error;
mod sequence;

pub use config::SequenceConfig;
pub use error::{SequenceError, SequenceResult};
pub use sequence::{start_sequence, Sequence, SequenceManager};

#[cfg(test)]
mod tests;
