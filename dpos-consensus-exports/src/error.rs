// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_ledger::LedgerError;
use dpos_models::{ErrorKind, ModelsError};
use dpos_pool_exports::PoolError;
use dpos_protocol_exports::ProtocolError;
use dpos_rounds::RoundsError;
use dpos_sequence::SequenceError;
use dpos_storage::StorageError;
use dpos_transactions::TransactionError;
use thiserror::Error;

/// Result type of consensus operations
pub type ConsensusResult<T, E = ConsensusError> = core::result::Result<T, E>;

/// Consensus error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum ConsensusError {
    /// malformed block {0}: {1}
    MalformedBlock(String, String),
    /// invalid block {0}: {1}
    InvalidBlock(String, String),
    /// block {block_id} forged by {generator}, slot {slot} belongs to {expected}
    WrongForger {
        /// block
        block_id: String,
        /// its generator
        generator: String,
        /// slot of the block
        slot: u64,
        /// delegate assigned to the slot
        expected: String,
    },
    /// block {0} is already stored
    DuplicateBlock(String),
    /// transaction {tx_id} of block {block_id} rejected: {source}
    BlockTransaction {
        /// block
        block_id: String,
        /// transaction
        tx_id: String,
        /// rejection
        source: TransactionError,
    },
    /// the genesis block can not be removed
    CannotRemoveGenesis,
    /// peer {0} shares no recent block with the local chain
    NoCommonBlock(String),
    /// block pipeline halted: {0}
    Halted(String),
    /// there was an inconsistency between containers {0}
    ContainerInconsistency(String),
    /// could not create genesis block {0}
    GenesisCreationError(String),
    /// transaction error: {0}
    TransactionError(#[from] TransactionError),
    /// rounds error: {0}
    RoundsError(#[from] RoundsError),
    /// storage error: {0}
    StorageError(#[from] StorageError),
    /// ledger error: {0}
    LedgerError(#[from] LedgerError),
    /// pool error: {0}
    PoolError(#[from] PoolError),
    /// protocol error: {0}
    ProtocolError(#[from] ProtocolError),
    /// sequence error: {0}
    SequenceError(#[from] SequenceError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
}

impl ConsensusError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::MalformedBlock(..) => ErrorKind::Malformed,
            ConsensusError::InvalidBlock(..) | ConsensusError::WrongForger { .. } => {
                ErrorKind::Unverifiable
            }
            ConsensusError::DuplicateBlock(_) => ErrorKind::Conflict,
            ConsensusError::BlockTransaction { source, .. } => source.kind(),
            ConsensusError::CannotRemoveGenesis | ConsensusError::NoCommonBlock(_) => {
                ErrorKind::PolicyViolation
            }
            ConsensusError::Halted(_)
            | ConsensusError::ContainerInconsistency(_)
            | ConsensusError::GenesisCreationError(_) => ErrorKind::Fatal,
            ConsensusError::TransactionError(err) => err.kind(),
            ConsensusError::RoundsError(err) => err.kind(),
            ConsensusError::StorageError(err) => err.kind(),
            ConsensusError::LedgerError(err) => err.kind(),
            ConsensusError::PoolError(err) => err.kind(),
            ConsensusError::ProtocolError(err) => err.kind(),
            ConsensusError::SequenceError(_) => ErrorKind::Transient,
            ConsensusError::ModelsError(err) => err.kind(),
        }
    }
}
