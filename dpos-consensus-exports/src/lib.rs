// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Definition and exports of the chain types, events and errors.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod channels;
mod controller_trait;
mod settings;

pub mod error;
pub mod events;
pub mod types;

pub use channels::{ConsensusBroadcasts, ConsensusChannels};
pub use controller_trait::{ConsensusController, ConsensusManager};
pub use settings::{ConsensusConfig, GenesisConfig};

#[cfg(feature = "test-exports")]
pub use controller_trait::MockConsensusController;
