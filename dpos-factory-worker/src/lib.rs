// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Forging scheduler: once per tick, forges a block when the current slot belongs to a
//! local delegate and enough peers agree with the local chain.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod block_factory;
mod controller;
mod manager;
mod run;
mod state;

pub use run::start_factory;

#[cfg(test)]
mod tests;
