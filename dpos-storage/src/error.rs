// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_models::ErrorKind;
use thiserror::Error;

/// Result type of storage operations
pub type StorageResult<T, E = StorageError> = core::result::Result<T, E>;

/// Storage error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum StorageError {
    /// block {0} already stored
    BlockAlreadyStored(String),
    /// height {0} already occupied
    HeightOccupied(u32),
    /// transaction {0} already confirmed
    TransactionAlreadyStored(String),
    /// not found: {0}
    NotFound(String),
    /// stored data could not be decoded: {0}
    DeserializeError(String),
    /// only the last block can be removed, {0} is not the last block
    NotLastBlock(String),
    /// storage unavailable: {0}
    Unavailable(String),
}

impl StorageError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::BlockAlreadyStored(_)
            | StorageError::HeightOccupied(_)
            | StorageError::TransactionAlreadyStored(_) => ErrorKind::Conflict,
            StorageError::NotFound(_) | StorageError::NotLastBlock(_) => ErrorKind::Fatal,
            StorageError::DeserializeError(_) => ErrorKind::Fatal,
            StorageError::Unavailable(_) => ErrorKind::Transient,
        }
    }
}
