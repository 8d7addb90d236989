// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Account ledger. `merge` is the only way account balances, flags and sets change:
//! every change is an `AccountDelta` whose negation restores the account exactly.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod controller_traits;
mod error;
mod ledger;

pub use controller_traits::LedgerController;
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;

#[cfg(feature = "test-exports")]
pub use controller_traits::MockLedgerController;

#[cfg(test)]
mod tests;
