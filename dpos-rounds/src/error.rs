// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_ledger::LedgerError;
use dpos_models::ErrorKind;
use dpos_storage::StorageError;
use thiserror::Error;

/// Result type of the round manager
pub type RoundsResult<T, E = RoundsError> = core::result::Result<T, E>;

/// Round manager error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum RoundsError {
    /// ledger error: {0}
    LedgerError(#[from] LedgerError),
    /// storage error: {0}
    StorageError(#[from] StorageError),
    /// {found} registered delegates, {required} needed to open a round
    NotEnoughDelegates {
        /// delegates found in the ledger
        found: usize,
        /// size of the active set
        required: usize,
    },
    /// no snapshot for round {0}
    MissingSnapshot(u64),
    /// the genesis block can not be removed
    CannotRevertGenesis,
    /// block at height {height} does not follow height {last}
    UnexpectedHeight {
        /// height of the block
        height: u32,
        /// last ticked height
        last: u32,
    },
    /// inconsistent round state: {0}
    Inconsistent(String),
}

impl RoundsError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoundsError::LedgerError(err) => err.kind(),
            RoundsError::StorageError(err) => err.kind(),
            RoundsError::CannotRevertGenesis | RoundsError::UnexpectedHeight { .. } => {
                ErrorKind::PolicyViolation
            }
            RoundsError::NotEnoughDelegates { .. }
            | RoundsError::MissingSnapshot(_)
            | RoundsError::Inconsistent(_) => ErrorKind::Fatal,
        }
    }
}
