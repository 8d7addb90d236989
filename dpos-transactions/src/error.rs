// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_ledger::LedgerError;
use dpos_models::{ErrorKind, ModelsError};
use dpos_storage::StorageError;
use thiserror::Error;

/// Result type of the transaction engine
pub type TransactionResult<T, E = TransactionError> = core::result::Result<T, E>;

/// Transaction error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum TransactionError {
    /// malformed transaction: {0}
    Malformed(String),
    /// invalid id: declared {declared}, computed {computed}
    InvalidId {
        /// id carried by the transaction
        declared: String,
        /// id of its bytes
        computed: String,
    },
    /// unknown sender {0}
    UnknownSender(String),
    /// invalid signature: {0}
    InvalidSignature(String),
    /// sender public key {0} does not match the account
    SenderKeyMismatch(String),
    /// invalid requester: {0}
    InvalidRequester(String),
    /// invalid recipient: {0}
    InvalidRecipient(String),
    /// invalid co-signatures: {0}
    InvalidCosignatures(String),
    /// invalid amount: {0}
    InvalidAmount(String),
    /// fee {actual} below the minimum {minimum}
    FeeTooLow {
        /// required fee
        minimum: String,
        /// carried fee
        actual: String,
    },
    /// timestamp in slot {slot}, current slot is {current}
    FutureTimestamp {
        /// slot of the transaction timestamp
        slot: u64,
        /// current slot
        current: u64,
    },
    /// account {address} has {balance}, needs {required}
    InsufficientFunds {
        /// sender address
        address: String,
        /// available balance
        balance: i64,
        /// amount plus fee
        required: u64,
    },
    /// policy violation: {0}
    PolicyViolation(String),
    /// transaction {0} is already confirmed
    AlreadyConfirmed(String),
    /// ledger error: {0}
    LedgerError(#[from] LedgerError),
    /// storage error: {0}
    StorageError(#[from] StorageError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
}

impl TransactionError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Malformed(_)
            | TransactionError::InvalidRecipient(_)
            | TransactionError::InvalidAmount(_) => ErrorKind::Malformed,
            TransactionError::InvalidId { .. }
            | TransactionError::UnknownSender(_)
            | TransactionError::InvalidSignature(_)
            | TransactionError::SenderKeyMismatch(_)
            | TransactionError::InvalidRequester(_)
            | TransactionError::InvalidCosignatures(_)
            | TransactionError::FutureTimestamp { .. } => ErrorKind::Unverifiable,
            TransactionError::FeeTooLow { .. } | TransactionError::PolicyViolation(_) => {
                ErrorKind::PolicyViolation
            }
            TransactionError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            TransactionError::AlreadyConfirmed(_) => ErrorKind::Conflict,
            TransactionError::LedgerError(err) => err.kind(),
            TransactionError::StorageError(err) => err.kind(),
            TransactionError::ModelsError(err) => err.kind(),
        }
    }
}
