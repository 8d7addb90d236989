// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_models::ErrorKind;
use dpos_storage::StorageError;
use thiserror::Error;

/// Result type of ledger operations
pub type LedgerResult<T, E = LedgerError> = core::result::Result<T, E>;

/// Ledger error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum LedgerError {
    /// storage error: {0}
    StorageError(#[from] StorageError),
    /// overflow of {field} on account {address}
    Overflow {
        /// account address
        address: String,
        /// overflowing field
        field: &'static str,
    },
    /// account {0} not found
    AccountNotFound(String),
}

impl LedgerError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::StorageError(err) => err.kind(),
            LedgerError::Overflow { .. } => ErrorKind::Fatal,
            LedgerError::AccountNotFound(_) => ErrorKind::Fatal,
        }
    }
}
