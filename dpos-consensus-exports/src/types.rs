// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Values exchanged with the consensus controller

use dpos_models::BlockId;
use dpos_protocol_exports::PeerId;
use serde::Serialize;

/// Where a block comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSource {
    /// received from a peer
    Peer(PeerId),
    /// forged by a local delegate: the assigned forger check is skipped
    Forged,
}

impl BlockSource {
    /// Whether the block was forged locally
    pub fn is_forged(&self) -> bool {
        matches!(self, BlockSource::Forged)
    }

    /// Peer that sent the block
    pub fn peer(&self) -> Option<&PeerId> {
        match self {
            BlockSource::Peer(peer) => Some(peer),
            BlockSource::Forged => None,
        }
    }
}

/// What happened to a received block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockOutcome {
    /// verified, applied and stored as the new last block
    Applied,
    /// replaced the last block, which lost the fork choice
    Swapped,
    /// already known, or too old to matter
    Ignored,
    /// competes with a known block at the same height on the same parent
    Orphaned,
    /// built on another chain
    Forked,
    /// too far ahead, kept until its parent arrives
    Stashed,
}

/// Reason of a fork signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForkCause {
    /// the next block does not build on the last block
    PreviousMismatch,
    /// the forger is not the delegate assigned to the slot
    WrongForger,
    /// a delegate forged two blocks at the same height
    DoubleForging,
    /// a block at a known height builds on another parent
    ForkedChain,
    /// a competing block won the fork choice and replaced the last block
    EarlierBlock,
    /// not enough polled peers agree with the local chain
    QuorumNotReached,
}

/// Chain state figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsensusStats {
    /// height of the last block
    pub height: u32,
    /// id of the last block
    pub last_block_id: BlockId,
    /// heights held in the cache
    pub cached_blocks: usize,
    /// orphans kept for the fork choice
    pub orphans: usize,
    /// blocks waiting for their parent
    pub stashed: usize,
    /// whether the pipeline stopped after an inconsistency
    pub halted: bool,
}
