// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_consensus_exports::{ConsensusBroadcasts, ConsensusController};
use dpos_models::BlockId;
use dpos_pool_exports::PoolController;
use dpos_protocol_exports::{PeerId, PeerRpc, PeerSet};
use serde::Serialize;

/// List of channels the factory will send commands to
pub struct FactoryChannels {
    /// consensus controller, receives the forged blocks
    pub consensus: Box<dyn ConsensusController>,
    /// pool controller, provides the block transactions
    pub pool: Box<dyn PoolController>,
    /// peer calls of the quorum poll
    pub peer_rpc: Box<dyn PeerRpc>,
    /// peers eligible for the quorum poll
    pub peer_set: PeerSet,
    /// event bus, for fork signals
    pub broadcasts: ConsensusBroadcasts,
}

/// Result of one forging attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ForgingOutcome {
    /// forging is disabled on this node
    Disabled,
    /// past the first half of the slot
    OutsideWindow,
    /// the slot belongs to a delegate this node does not forge for
    NotOurSlot {
        /// current slot
        slot: u64,
    },
    /// the last block already fills the slot
    SlotTaken {
        /// current slot
        slot: u64,
    },
    /// no answering peer is at the local height
    NoPeers,
    /// a polled peer has a longer chain
    PeerAhead {
        /// that peer
        peer: PeerId,
        /// its height
        height: u32,
    },
    /// too few polled peers agree with the last block
    QuorumNotReached {
        /// peers agreeing on the last block, the slot and forging
        agreeing: usize,
        /// answering peers at the local height
        height_matching: usize,
    },
    /// a block was forged and handed to consensus
    Forged {
        /// the block
        block_id: BlockId,
        /// its height
        height: u32,
    },
}
