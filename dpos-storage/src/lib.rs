// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Persistence contract of the node: accounts, blocks with their raw transactions,
//! confirmed transaction index and per-round delegate snapshots.
//!
//! The node only relies on the `StorageController` trait. `MemoryStorage` is the
//! implementation used by the binary and the tests.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod controller_traits;
mod error;
mod memory;

pub use controller_traits::StorageController;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;

#[cfg(feature = "test-exports")]
pub use controller_traits::MockStorageController;

#[cfg(test)]
mod tests;
