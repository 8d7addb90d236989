// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_consensus_exports::types::ConsensusStats;
use dpos_models::BlockId;
use dpos_rounds::RoundManager;

mod chain;

pub(crate) use chain::{ChainState, Classification};

/// State shared by the worker and the controller.
///
/// Mutated from the blocks and balances sequences only; readers take the lock directly.
pub(crate) struct ConsensusState {
    /// recent blocks, orphans and stashed blocks
    pub chain: ChainState,
    /// round bookkeeping, ticked with every applied block
    pub rounds: RoundManager,
    /// reason the pipeline stopped, if it did
    pub halted: Option<String>,
    /// a synchronization task is queued
    pub sync_pending: bool,
}

impl ConsensusState {
    pub fn new(cache_size: usize, rounds: RoundManager) -> Self {
        ConsensusState {
            chain: ChainState::new(cache_size),
            rounds,
            halted: None,
            sync_pending: false,
        }
    }

    pub fn stats(&self, genesis_id: BlockId) -> ConsensusStats {
        ConsensusStats {
            height: self.chain.height(),
            last_block_id: self
                .chain
                .last_block()
                .map_or(genesis_id, |block| block.id),
            cached_blocks: self.chain.cached_blocks(),
            orphans: self.chain.orphans(),
            stashed: self.chain.stashed(),
            halted: self.halted.is_some(),
        }
    }
}
