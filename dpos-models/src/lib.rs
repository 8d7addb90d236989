// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Data model and wire codec of the DPoS chain: addresses, amounts, transactions,
//! blocks, accounts, slot and round arithmetic, reward milestones.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

pub use account::Account;
pub use address::Address;
pub use amount::Amount;
pub use block::{Block, BlockDeserializer, BlockId, BlockSerializer, BlockTag, Payload};
pub use delta::{AccountDelta, FieldChange};
pub use error::{ErrorKind, ModelsError, ModelsResult};
pub use exceptions::ExceptionTable;
pub use fees::FeeSchedule;
pub use milestones::MilestoneSchedule;
pub use rounds::{DelegateSnapshot, RoundSnapshot};
pub use slots::SlotClock;
pub use transaction::{
    SetAction, SetEntry, Transaction, TransactionAsset, TransactionDeserializer, TransactionId,
    TransactionSerializer, TransactionType,
};

/// accounts as stored in the ledger
pub mod account;
/// base58check addresses
pub mod address;
/// fixed-point coin amounts
pub mod amount;
/// block model and header codec
pub mod block;
/// network constants
pub mod config;
/// invertible account changes
pub mod delta;
/// models error
pub mod error;
/// legacy compatibility table
pub mod exceptions;
/// minimum fee per transaction type
pub mod fees;
/// block reward schedule
pub mod milestones;
/// round arithmetic
pub mod rounds;
/// relation between time and slots
pub mod slots;
/// transaction model and codec
pub mod transaction;
