// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::controller_impl::PoolControllerImpl;
use crate::transaction_pool::TransactionPool;
use crate::worker::{PoolManagerImpl, PoolWorker};
use dpos_pool_exports::{PoolConfig, PoolController, PoolError, PoolManager, PoolResult};
use dpos_sequence::Sequence;
use dpos_transactions::TransactionEngine;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;
use tracing::info;

/// Starts the pool and its periodic worker.
///
/// # Arguments
/// * `config`: pool limits and intervals
/// * `engine`: transaction engine over the shared ledger
/// * `balances`: sequence owning the unconfirmed tier
pub fn start_pool_controller(
    config: PoolConfig,
    engine: TransactionEngine,
    balances: Sequence,
) -> PoolResult<(Box<dyn PoolManager>, Box<dyn PoolController>)> {
    let controller = PoolControllerImpl {
        pool: Arc::new(RwLock::new(TransactionPool::new(config.clone()))),
        config,
        engine,
        balances,
    };
    let (stop_sender, stop_receiver) = crossbeam_channel::bounded(0);
    let worker = PoolWorker::new(controller.clone(), stop_receiver);
    let join_handle = thread::Builder::new()
        .name("pool worker".into())
        .spawn(move || worker.run())
        .map_err(|err| PoolError::SpawnError(err.to_string()))?;
    info!("pool worker started");
    Ok((
        Box::new(PoolManagerImpl {
            worker: Some((stop_sender, join_handle)),
        }),
        Box::new(controller),
    ))
}
