// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ConsensusResult;
use crate::events::ConsensusEvent;
use crate::types::{BlockOutcome, BlockSource, ConsensusStats};
use dpos_models::{Block, BlockId, Transaction};
use dpos_protocol_exports::PeerId;
use dpos_rounds::ForgingStats;
use dpos_signature::PublicKey;
use tokio::sync::broadcast;

/// Interface of the consensus worker.
///
/// Mutations are queued on the blocks sequence and the call waits for their outcome.
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait ConsensusController: Send + Sync {
    /// Classifies a block and, when it extends or wins against the chain, runs it through
    /// the pipeline
    fn receive_block(&self, block: Block, source: BlockSource) -> ConsensusResult<BlockOutcome>;

    /// Removes the last block, returning its transactions to the pool
    fn pop_last_block(&self) -> ConsensusResult<Block>;

    /// Admits transactions to the pool and relays the accepted ones
    fn receive_transactions(&self, transactions: Vec<Transaction>, bundled: bool) -> usize;

    /// Joins the chain of `peer` when it is ahead: rewinds to the common block, then
    /// applies the peer's blocks. Returns the number of blocks applied.
    fn sync_with_peer(&self, peer: PeerId) -> ConsensusResult<usize>;

    /// Last block of the chain
    fn get_last_block(&self) -> Block;

    /// Stored block by id
    fn get_block(&self, block_id: &BlockId) -> ConsensusResult<Option<Block>>;

    /// Ids of the most recent blocks, newest first
    fn get_recent_block_ids(&self, count: usize) -> Vec<BlockId>;

    /// Delegate assigned to `slot` in the round of the next block
    fn get_slot_delegate(&self, slot: u64) -> ConsensusResult<PublicKey>;

    /// Forging order of the round of the next block
    fn get_active_delegates(&self) -> ConsensusResult<Vec<PublicKey>>;

    /// Forging record of a delegate
    fn get_forging_stats(&self, public_key: &PublicKey) -> ConsensusResult<Option<ForgingStats>>;

    /// Chain state figures
    fn get_stats(&self) -> ConsensusStats;

    /// New subscription to the event bus
    fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn ConsensusController>`.
    fn clone_box(&self) -> Box<dyn ConsensusController>;
}

/// Allow cloning `Box<dyn ConsensusController>`
/// Uses `ConsensusController::clone_box` internally
impl Clone for Box<dyn ConsensusController> {
    fn clone(&self) -> Box<dyn ConsensusController> {
        self.clone_box()
    }
}

/// Consensus manager used to stop the consensus worker
pub trait ConsensusManager {
    /// Stop the consensus worker
    fn stop(&mut self);
}
