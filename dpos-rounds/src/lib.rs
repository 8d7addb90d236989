// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Round manager: delegate ranking and forging order, round-boundary bookkeeping
//! (rewards, produced and missed blocks, vote weights) and its exact inverse on block removal.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod error;
mod manager;
mod shuffle;

pub use config::RoundsConfig;
pub use error::{RoundsError, RoundsResult};
pub use manager::{ForgingStats, RoundManager};
pub use shuffle::shuffle_delegates;

#[cfg(test)]
mod tests;
