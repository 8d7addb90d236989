// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Definition and exports of the forging scheduler types and errors.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod controller_traits;
mod error;
mod types;

pub use config::FactoryConfig;
pub use controller_traits::{FactoryController, FactoryManager};
pub use error::{FactoryError, FactoryResult};
pub use types::{FactoryChannels, ForgingOutcome};

#[cfg(feature = "test-exports")]
pub use controller_traits::MockFactoryController;
