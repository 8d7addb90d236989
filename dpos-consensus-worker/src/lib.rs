// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Block pipeline of the node: chain state, block reception, fork choice and
//! synchronization with peers.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod controller;
mod manager;
mod state;
mod tools;
mod worker;

pub use tools::{start_consensus_controller, SharedSequences};
pub use worker::build_genesis_block;

#[cfg(test)]
mod tests;
