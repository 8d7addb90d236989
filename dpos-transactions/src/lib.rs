// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Transaction engine: fee calculation, verification against the ledger and the two-tier
//! (unconfirmed / confirmed) application of transactions, with their exact undo.
//!
//! Each transaction type implements `TransactionLogic`. The generic checks and the sender
//! debit live in `TransactionEngine`, which dispatches to the logic of the transaction type.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod engine;
mod error;
mod logic;
mod types;

pub use config::TransactionConfig;
pub use engine::{TransactionEngine, TransactionRequest};
pub use error::{TransactionError, TransactionResult};
pub use logic::{logic_for, LogicContext, TransactionLogic};

#[cfg(test)]
mod tests;
