// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::worker::ConsensusWorker;
use dpos_consensus_exports::error::ConsensusResult;
use dpos_consensus_exports::events::ConsensusEvent;
use dpos_consensus_exports::types::{BlockOutcome, BlockSource, ConsensusStats};
use dpos_consensus_exports::ConsensusController;
use dpos_models::{Block, BlockId, Transaction};
use dpos_protocol_exports::{BroadcastMessage, PeerId};
use dpos_rounds::ForgingStats;
use dpos_signature::PublicKey;
use tokio::sync::broadcast;
use tracing::debug;

/// Mutations are queued on the blocks sequence, reads go to the shared state.
///
/// Readers may observe the state between two queued tasks, never in the middle of one
/// block application.
#[derive(Clone)]
pub struct ConsensusControllerImpl {
    pub(crate) worker: ConsensusWorker,
}

impl ConsensusController for ConsensusControllerImpl {
    fn receive_block(&self, block: Block, source: BlockSource) -> ConsensusResult<BlockOutcome> {
        let worker = self.worker.clone();
        self.worker
            .blocks
            .add_and_wait(move || worker.receive(block, source))?
    }

    fn pop_last_block(&self) -> ConsensusResult<Block> {
        let worker = self.worker.clone();
        self.worker.blocks.add_and_wait(move || {
            let popped = worker.pop_last_block();
            if let Err(err) = &popped {
                worker.on_failure(err, None);
            }
            popped
        })?
    }

    fn receive_transactions(&self, transactions: Vec<Transaction>, bundled: bool) -> usize {
        let pool = &self.worker.channels.pool;
        let accepted = pool.receive_transactions(transactions.clone(), bundled);
        if accepted == 0 {
            return 0;
        }
        self.worker
            .channels
            .broadcasts
            .emit(ConsensusEvent::TransactionsReceived { count: accepted });
        let relayed: Vec<Transaction> = transactions
            .into_iter()
            .filter(|transaction| pool.transaction_in_pool(&transaction.id))
            .collect();
        if let Err(err) = self.worker.channels.peer_rpc.broadcast(
            BroadcastMessage::Transactions(relayed),
            self.worker.config.broadcast_fanout,
        ) {
            debug!("could not relay transactions: {}", err);
        }
        accepted
    }

    fn sync_with_peer(&self, peer: PeerId) -> ConsensusResult<usize> {
        let worker = self.worker.clone();
        self.worker.blocks.add_and_wait(move || worker.sync(&peer))?
    }

    fn get_last_block(&self) -> Block {
        self.worker.last_block()
    }

    fn get_block(&self, block_id: &BlockId) -> ConsensusResult<Option<Block>> {
        Ok(self.worker.storage.get_block(block_id)?)
    }

    fn get_recent_block_ids(&self, count: usize) -> Vec<BlockId> {
        self.worker.state.read().chain.recent_ids(count)
    }

    fn get_slot_delegate(&self, slot: u64) -> ConsensusResult<PublicKey> {
        Ok(self.worker.state.read().rounds.get_slot_delegate(slot)?)
    }

    fn get_active_delegates(&self) -> ConsensusResult<Vec<PublicKey>> {
        Ok(self.worker.state.read().rounds.active_delegates()?)
    }

    fn get_forging_stats(&self, public_key: &PublicKey) -> ConsensusResult<Option<ForgingStats>> {
        Ok(self.worker.state.read().rounds.get_forging_stats(public_key)?)
    }

    fn get_stats(&self) -> ConsensusStats {
        self.worker.state.read().stats(self.worker.genesis.id)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent> {
        self.worker.channels.broadcasts.subscribe()
    }

    fn clone_box(&self) -> Box<dyn ConsensusController> {
        Box::new(self.clone())
    }
}
