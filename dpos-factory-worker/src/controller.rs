// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module implements a factory controller.
//! See `dpos-factory-exports/controller_traits.rs` for functional details.

use crate::state::ForgingState;
use dpos_factory_exports::{FactoryController, FactoryError, FactoryResult, ForgingOutcome};
use dpos_signature::PublicKey;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// implementation of the factory controller
#[derive(Clone)]
pub struct FactoryControllerImpl {
    pub(crate) state: Arc<RwLock<ForgingState>>,
}

impl FactoryController for FactoryControllerImpl {
    fn get_forging_delegates(&self) -> Vec<(PublicKey, bool)> {
        self.state
            .read()
            .delegates
            .iter()
            .map(|(public_key, delegate)| (*public_key, delegate.enabled))
            .collect()
    }

    fn set_delegate_forging(&self, public_key: &PublicKey, enable: bool) -> FactoryResult<()> {
        let mut state = self.state.write();
        let delegate = state
            .delegates
            .get_mut(public_key)
            .ok_or_else(|| FactoryError::UnknownDelegate(public_key.to_string()))?;
        delegate.enabled = enable;
        info!(
            "forging {} for delegate {}",
            if enable { "enabled" } else { "disabled" },
            public_key
        );
        Ok(())
    }

    fn set_forging(&self, enable: bool) {
        self.state.write().enabled = enable;
        info!("forging {}", if enable { "enabled" } else { "disabled" });
    }

    fn is_forging(&self) -> bool {
        self.state.read().enabled
    }

    fn get_last_outcome(&self) -> Option<ForgingOutcome> {
        self.state.read().last_outcome.clone()
    }

    /// Returns a boxed clone of self.
    /// Allows cloning `Box<dyn FactoryController>`,
    /// see `dpos-factory-exports/controller_traits.rs`
    fn clone_box(&self) -> Box<dyn FactoryController> {
        Box::new(self.clone())
    }
}
