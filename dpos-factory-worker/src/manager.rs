// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module implements a factory manager.
//! See `dpos-factory-exports/controller_traits.rs` for functional details.

use crossbeam_channel::Sender;
use dpos_factory_exports::FactoryManager;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Implementation of the factory manager
/// Allows stopping the factory worker
pub struct FactoryManagerImpl {
    /// block worker message sender and join handle
    pub(crate) block_worker: Option<(Sender<()>, JoinHandle<()>)>,
}

impl FactoryManager for FactoryManagerImpl {
    /// stops the worker
    fn stop(&mut self) {
        info!("stopping factory...");
        if let Some((stop_sender, join_handle)) = self.block_worker.take() {
            std::mem::drop(stop_sender);
            if let Err(err) = join_handle.join() {
                warn!("block factory worker panicked: {:?}", err);
            }
        }
        info!("factory stopped");
    }
}
