// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::types::PoolKind;
use displaydoc::Display;
use dpos_models::ErrorKind;
use dpos_sequence::SequenceError;
use dpos_time::TimeError;
use dpos_transactions::TransactionError;
use thiserror::Error;

/// Result type of pool operations
pub type PoolResult<T, E = PoolError> = core::result::Result<T, E>;

/// Pool error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum PoolError {
    /// transaction {0} is already in the pool
    AlreadyInPool(String),
    /// {pool:?} pool is full ({capacity} transactions)
    Full {
        /// sub-pool refusing the transaction
        pool: PoolKind,
        /// its capacity
        capacity: usize,
    },
    /// transaction {0} is not waiting for signatures
    NotPending(String),
    /// signature already attached to transaction {0}
    DuplicateSignature(String),
    /// transaction error: {0}
    TransactionError(#[from] TransactionError),
    /// sequence error: {0}
    SequenceError(#[from] SequenceError),
    /// time error: {0}
    TimeError(#[from] TimeError),
    /// could not spawn the pool worker: {0}
    SpawnError(String),
}

impl PoolError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::AlreadyInPool(_) | PoolError::DuplicateSignature(_) => ErrorKind::Conflict,
            PoolError::Full { .. } | PoolError::SequenceError(_) | PoolError::TimeError(_) => {
                ErrorKind::Transient
            }
            PoolError::NotPending(_) => ErrorKind::PolicyViolation,
            PoolError::TransactionError(err) => err.kind(),
            PoolError::SpawnError(_) => ErrorKind::Fatal,
        }
    }
}
