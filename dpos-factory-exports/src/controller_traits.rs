// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module exports generic traits representing interfaces for interacting
//! with the factory worker.

use crate::error::FactoryResult;
use crate::types::ForgingOutcome;
use dpos_signature::PublicKey;

/// interface that communicates with the factory worker thread
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait FactoryController: Send + Sync {
    /// Delegates managed by this node, with whether each one forges
    fn get_forging_delegates(&self) -> Vec<(PublicKey, bool)>;

    /// Enable or disable forging for one managed delegate
    fn set_delegate_forging(&self, public_key: &PublicKey, enable: bool) -> FactoryResult<()>;

    /// Enable or disable forging for the whole node
    fn set_forging(&self, enable: bool);

    /// Whether the node forges
    fn is_forging(&self) -> bool;

    /// Outcome of the latest forging attempt
    fn get_last_outcome(&self) -> Option<ForgingOutcome>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn FactoryController>`.
    fn clone_box(&self) -> Box<dyn FactoryController>;
}

/// Allow cloning `Box<dyn FactoryController>`
/// Uses `FactoryController::clone_box` internally
impl Clone for Box<dyn FactoryController> {
    fn clone(&self) -> Box<dyn FactoryController> {
        self.clone_box()
    }
}

/// Factory manager used to stop the factory thread
pub trait FactoryManager {
    /// Stop the factory thread
    /// Note that we do not take self by value to consume it
    /// because it is not allowed to move out of Box<dyn FactoryManager>
    fn stop(&mut self);
}
