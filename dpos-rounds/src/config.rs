// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_models::config::constants::{ACTIVE_DELEGATES, ADDRESS_VERSION};
use serde::Deserialize;

/// Round manager configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoundsConfig {
    /// size of the active delegate set, also the length of a round in blocks
    pub delegates: usize,
    /// network byte of addresses
    pub address_version: u8,
}

impl Default for RoundsConfig {
    fn default() -> Self {
        RoundsConfig {
            delegates: ACTIVE_DELEGATES,
            address_version: ADDRESS_VERSION,
        }
    }
}
