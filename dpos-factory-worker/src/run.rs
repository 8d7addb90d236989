// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::block_factory::BlockFactoryWorker;
use crate::controller::FactoryControllerImpl;
use crate::manager::FactoryManagerImpl;
use crate::state::ForgingState;
use dpos_factory_exports::{
    FactoryChannels, FactoryConfig, FactoryController, FactoryError, FactoryManager,
    FactoryResult,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;
use tracing::info;

/// Start factory
///
/// # Arguments
/// * `config`: factory settings
/// * `channels`: consensus, pool and peers the factory talks to
///
/// # Return value
/// The manager stopping the factory thread and the controller toggling forging
pub fn start_factory(
    config: FactoryConfig,
    channels: FactoryChannels,
) -> FactoryResult<(Box<dyn FactoryManager>, Box<dyn FactoryController>)> {
    let state = Arc::new(RwLock::new(ForgingState::from_passphrases(
        &config.delegate_passphrases,
        config.forging_enabled,
    )?));
    let delegates = state.read().delegates.len();

    let (factory_sender, factory_receiver) = crossbeam_channel::bounded(0);
    let worker = BlockFactoryWorker::new(config, state.clone(), channels, factory_receiver);
    let join_handle = thread::Builder::new()
        .name("block factory worker".into())
        .spawn(move || worker.run())
        .map_err(|err| FactoryError::SpawnError(err.to_string()))?;
    info!("block factory started with {} delegates", delegates);

    Ok((
        Box::new(FactoryManagerImpl {
            block_worker: Some((factory_sender, join_handle)),
        }),
        Box::new(FactoryControllerImpl { state }),
    ))
}
