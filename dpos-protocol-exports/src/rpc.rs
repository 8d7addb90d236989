// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::{ProtocolError, ProtocolResult};
use crate::peer_id::PeerId;
use dpos_models::{Block, BlockId, Transaction, TransactionId};
use dpos_signature::Signature;

/// Payload relayed to peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastMessage {
    /// a block accepted locally
    Block(Box<Block>),
    /// transactions admitted to the pool
    Transactions(Vec<Transaction>),
    /// a co-signature attached to a pending transaction
    Signature {
        /// transaction being co-signed
        transaction_id: TransactionId,
        /// the co-signature
        signature: Signature,
    },
}

/// What a peer reports about its chain and its clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatus {
    /// header (block without transactions) of the peer's last block
    pub header: Block,
    /// slot the peer's clock is in
    pub current_slot: u64,
    /// whether the peer would let a delegate forge now
    pub forging_allowed: bool,
}

/// Calls the node makes to its peers.
///
/// Implementations bound every call by the configured peer timeout and report a timeout as
/// `ProtocolError::Timeout`. Nothing is retried behind the caller's back.
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait PeerRpc: Send + Sync {
    /// Height of the peer's last block
    fn get_height(&self, peer: &PeerId) -> ProtocolResult<u32>;

    /// Last block header, current slot and forging eligibility of the peer
    fn get_status(&self, peer: &PeerId) -> ProtocolResult<PeerStatus>;

    /// Highest block of `ids` the peer also has
    fn get_common_block(&self, peer: &PeerId, ids: Vec<BlockId>) -> ProtocolResult<Option<Block>>;

    /// Up to `limit` blocks following `height`, with their transactions
    fn get_blocks_after(&self, peer: &PeerId, height: u32, limit: usize)
        -> ProtocolResult<Vec<Block>>;

    /// Sends `message` to at most `fanout` peers, returns how many received it
    fn broadcast(&self, message: BroadcastMessage, fanout: usize) -> ProtocolResult<usize>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn PeerRpc>`.
    fn clone_box(&self) -> Box<dyn PeerRpc>;
}

/// Allow cloning `Box<dyn PeerRpc>`
/// Uses `PeerRpc::clone_box` internally
impl Clone for Box<dyn PeerRpc> {
    fn clone(&self) -> Box<dyn PeerRpc> {
        self.clone_box()
    }
}

/// `PeerRpc` of a node without transport: every query fails, broadcasts reach nobody
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflinePeerRpc;

impl PeerRpc for OfflinePeerRpc {
    fn get_height(&self, _peer: &PeerId) -> ProtocolResult<u32> {
        Err(ProtocolError::Offline)
    }

    fn get_status(&self, _peer: &PeerId) -> ProtocolResult<PeerStatus> {
        Err(ProtocolError::Offline)
    }

    fn get_common_block(&self, _peer: &PeerId, _ids: Vec<BlockId>) -> ProtocolResult<Option<Block>> {
        Err(ProtocolError::Offline)
    }

    fn get_blocks_after(
        &self,
        _peer: &PeerId,
        _height: u32,
        _limit: usize,
    ) -> ProtocolResult<Vec<Block>> {
        Err(ProtocolError::Offline)
    }

    fn broadcast(&self, _message: BroadcastMessage, _fanout: usize) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn clone_box(&self) -> Box<dyn PeerRpc> {
        Box::new(*self)
    }
}
