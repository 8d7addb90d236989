// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::controller_impl::PoolControllerImpl;
use crossbeam_channel::{select, tick, Receiver, Sender};
use dpos_pool_exports::{PoolController, PoolManager};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Background thread running the periodic pool passes
pub(crate) struct PoolWorker {
    controller: PoolControllerImpl,
    stop_receiver: Receiver<()>,
}

impl PoolWorker {
    pub(crate) fn new(controller: PoolControllerImpl, stop_receiver: Receiver<()>) -> Self {
        PoolWorker {
            controller,
            stop_receiver,
        }
    }

    fn bundle_pass(&self) {
        match self.controller.process_bundled() {
            Ok(0) => {}
            Ok(routed) => debug!("{} bundled transactions verified", routed),
            Err(err) => warn!("bundled pass failed: {}", err),
        }
        match self.controller.fill_pool() {
            Ok(0) => {}
            Ok(promoted) => debug!("{} transactions promoted to unconfirmed", promoted),
            Err(err) => warn!("pool fill failed: {}", err),
        }
    }

    fn expiry_pass(&self) {
        match self.controller.expire_transactions() {
            Ok(expired) if expired.is_empty() => {}
            Ok(expired) => debug!("{} transactions expired", expired.len()),
            Err(err) => warn!("expiry pass failed: {}", err),
        }
    }

    /// Runs until the stop channel is closed
    pub(crate) fn run(self) {
        let bundle_ticker = tick(self.controller.config.bundle_interval.to_duration());
        let expiry_ticker = tick(self.controller.config.expiry_interval.to_duration());
        loop {
            select! {
                recv(self.stop_receiver) -> _ => break,
                recv(bundle_ticker) -> _ => self.bundle_pass(),
                recv(expiry_ticker) -> _ => self.expiry_pass(),
            }
        }
        debug!("pool worker exiting");
    }
}

/// Implementation of the pool manager.
/// Allows stopping the pool worker
pub struct PoolManagerImpl {
    /// worker stop sender and join handle
    pub(crate) worker: Option<(Sender<()>, JoinHandle<()>)>,
}

impl PoolManager for PoolManagerImpl {
    /// stops the worker
    fn stop(&mut self) {
        info!("stopping pool worker...");
        if let Some((stop_sender, join_handle)) = self.worker.take() {
            std::mem::drop(stop_sender);
            if let Err(err) = join_handle.join() {
                warn!("pool worker panicked: {:?}", err);
            }
        }
        info!("pool worker stopped");
    }
}
