// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::controller::ConsensusControllerImpl;
use crate::manager::ConsensusManagerImpl;
use crate::state::ConsensusState;
use crate::worker::{build_genesis_block, ConsensusWorker};
use dpos_consensus_exports::error::{ConsensusError, ConsensusResult};
use dpos_consensus_exports::{
    ConsensusChannels, ConsensusConfig, ConsensusController, ConsensusManager,
};
use dpos_ledger::LedgerController;
use dpos_rounds::{RoundManager, RoundsConfig};
use dpos_sequence::{start_sequence, Sequence, SequenceConfig};
use dpos_storage::StorageController;
use dpos_transactions::TransactionEngine;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Sequences shared with the other components
#[derive(Clone)]
pub struct SharedSequences {
    /// ledger, rounds and unconfirmed tier
    pub balances: Sequence,
    /// storage writes
    pub storage: Sequence,
}

/// Creates the consensus controller, loads the chain from storage and applies the
/// genesis block on an empty one.
///
/// # Arguments
/// * `config`: consensus configuration
/// * `rounds_config`: active set configuration
/// * `channels`: pool, peers and event bus
/// * `engine`: transaction engine over the shared ledger
/// * `ledger`: account ledger
/// * `storage`: block and account storage
/// * `sequences`: sequences shared with the pool and storage writers
///
/// # Returns
/// The manager stopping the blocks sequence and the controller
pub fn start_consensus_controller(
    config: ConsensusConfig,
    rounds_config: RoundsConfig,
    channels: ConsensusChannels,
    engine: TransactionEngine,
    ledger: Box<dyn LedgerController>,
    storage: Box<dyn StorageController>,
    sequences: SharedSequences,
) -> ConsensusResult<(Box<dyn ConsensusManager>, Box<dyn ConsensusController>)> {
    let genesis = build_genesis_block(
        &config.genesis,
        config.block_version,
        rounds_config.address_version,
    )?;
    let rounds = RoundManager::new(rounds_config, ledger, storage.clone());
    let state = Arc::new(RwLock::new(ConsensusState::new(
        config.block_cache_size,
        rounds,
    )));
    let (blocks, blocks_manager) = start_sequence(SequenceConfig::new(
        "blocks",
        config.queue_warning_threshold,
    ))?;
    let worker = ConsensusWorker {
        clock: config.slot_clock(),
        config,
        channels: Arc::new(channels),
        engine,
        storage,
        state,
        genesis,
        blocks: blocks.clone(),
        balances: sequences.balances,
        storage_sequence: sequences.storage,
    };
    load_chain(&worker)?;

    let manager = ConsensusManagerImpl {
        blocks,
        blocks_manager: Some(blocks_manager),
    };
    Ok((
        Box::new(manager),
        Box::new(ConsensusControllerImpl { worker }),
    ))
}

fn load_chain(worker: &ConsensusWorker) -> ConsensusResult<()> {
    let Some(last) = worker.storage.get_last_block()? else {
        info!("empty chain, applying genesis block {}", worker.genesis.id);
        worker.process_block(worker.genesis.clone(), false)?;
        return Ok(());
    };
    match worker.storage.get_block_at_height(1)? {
        Some(stored) if stored.id == worker.genesis.id => {}
        Some(stored) => {
            return Err(ConsensusError::GenesisCreationError(format!(
                "stored genesis {} differs from configured genesis {}",
                stored.id, worker.genesis.id
            )))
        }
        None => {
            return Err(ConsensusError::ContainerInconsistency(
                "stored chain has no genesis block".into(),
            ))
        }
    }

    worker.state.write().rounds.load(last.height)?;
    let cache_size = worker.config.block_cache_size;
    let recent = worker
        .storage
        .get_blocks_after(last.height.saturating_sub(cache_size as u32), cache_size)?;
    let mut state = worker.state.write();
    for block in recent {
        state.chain.push_block(block);
    }
    info!(
        "chain loaded up to block {} at height {}",
        last.id, last.height
    );
    Ok(())
}
