// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Pool of transactions waiting to be included in a block.
//!
//! Four disjoint sub-pools: unconfirmed (applied to the unconfirmed ledger tier, competing
//! for the next block), queued (verified), multisignature (waiting for co-signatures) and
//! bundled (received in bulk, not verified yet).

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod controller_traits;
mod error;
mod types;

pub use config::PoolConfig;
pub use controller_traits::{PoolController, PoolManager};
pub use error::{PoolError, PoolResult};
pub use types::{PoolKind, PoolStats};

#[cfg(feature = "test-exports")]
pub use controller_traits::MockPoolController;
