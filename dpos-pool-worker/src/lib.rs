// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Pool of transactions waiting to be included in a block.
//!
//! Every mutation runs inside the `balances` sequence, the domain that owns the
//! unconfirmed ledger tier. Reads take the pool lock directly.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod controller_impl;
mod run;
mod transaction_pool;
mod worker;

pub use run::start_pool_controller;

#[cfg(test)]
mod tests;
