// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::types::{BlockSource, ForkCause};
use dpos_models::BlockId;

/// Events emitted by consensus on the event bus
#[derive(Debug, Clone, PartialEq)]
pub enum ConsensusEvent {
    /// a block entered reception
    BlockReceived {
        /// block
        block_id: BlockId,
        /// its height
        height: u32,
        /// sender
        source: BlockSource,
    },
    /// a block passed verification
    BlockVerified {
        /// block
        block_id: BlockId,
    },
    /// a block was applied and stored
    BlockProcessed {
        /// block
        block_id: BlockId,
        /// its height
        height: u32,
    },
    /// a local delegate forged a block
    BlockForged {
        /// block
        block_id: BlockId,
        /// its height
        height: u32,
    },
    /// the last block was removed
    BlockRemoved {
        /// block
        block_id: BlockId,
        /// its height
        height: u32,
    },
    /// the local chain disagrees with a block or with the peers
    Fork {
        /// block causing the signal, if any
        block_id: Option<BlockId>,
        /// reason
        cause: ForkCause,
    },
    /// transactions were admitted to the pool
    TransactionsReceived {
        /// accepted transactions
        count: usize,
    },
    /// a round began
    RoundStarted {
        /// round number
        round: u64,
    },
    /// a round was discarded by a block removal
    RoundReverted {
        /// round number
        round: u64,
    },
}
