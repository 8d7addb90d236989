// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::state::ConsensusState;
use dpos_consensus_exports::{ConsensusChannels, ConsensusConfig};
use dpos_models::{Block, SlotClock};
use dpos_sequence::Sequence;
use dpos_storage::StorageController;
use dpos_transactions::TransactionEngine;
use parking_lot::RwLock;
use std::sync::Arc;

mod genesis;
mod process;
mod reception;
mod sync;
mod verifications;

pub use genesis::build_genesis_block;

/// Everything the block pipeline needs. Clones share the same state.
///
/// Block reception and synchronization run in the `blocks` sequence. Ledger, pool and
/// round changes run in the `balances` sequence, storage writes in the `storage` one.
#[derive(Clone)]
pub(crate) struct ConsensusWorker {
    pub config: ConsensusConfig,
    pub clock: SlotClock,
    pub channels: Arc<ConsensusChannels>,
    pub engine: TransactionEngine,
    pub storage: Box<dyn StorageController>,
    pub state: Arc<RwLock<ConsensusState>>,
    pub genesis: Block,
    pub blocks: Sequence,
    pub balances: Sequence,
    pub storage_sequence: Sequence,
}

impl ConsensusWorker {
    /// Last block of the chain, genesis before anything was loaded
    pub fn last_block(&self) -> Block {
        self.state
            .read()
            .chain
            .last_block()
            .cloned()
            .unwrap_or_else(|| self.genesis.clone())
    }

    pub fn height(&self) -> u32 {
        self.state.read().chain.height()
    }
}
