// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file defines the factory settings

use dpos_models::config::constants::{
    BLOCK_TIME_SECONDS, BLOCK_VERSION, EPOCH, MAX_POLLED_PEERS, MAX_TRANSACTIONS_PER_BLOCK,
    MIN_QUORUM,
};
use dpos_models::{MilestoneSchedule, SlotClock};
use dpos_time::DposTime;
use serde::Deserialize;

/// Structure defining the settings of the factory
#[derive(Debug, Clone, Deserialize)]
pub struct FactoryConfig {
    /// secrets of the delegates forging on this node
    pub delegate_passphrases: Vec<String>,
    /// start with forging enabled
    pub forging_enabled: bool,
    /// delay between two forging attempts
    pub tick_interval: DposTime,
    /// fraction of the answering peers at the local height that must agree with the last block
    pub min_quorum: f64,
    /// peers polled before forging
    pub max_polled_peers: usize,
    /// forge when no answering peer is at the local height (single node networks)
    pub allow_forging_without_peers: bool,
    /// chain epoch
    pub epoch: DposTime,
    /// slot duration in seconds
    pub block_time: u32,
    /// version of the forged blocks
    pub block_version: u32,
    /// transaction count limit of a block
    pub max_transactions_per_block: usize,
    /// block reward schedule
    pub milestones: MilestoneSchedule,
}

impl FactoryConfig {
    /// Slot clock of the chain
    pub fn slot_clock(&self) -> SlotClock {
        SlotClock::new(self.epoch, self.block_time)
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        FactoryConfig {
            delegate_passphrases: Vec::new(),
            forging_enabled: true,
            tick_interval: DposTime::from_millis(1_000),
            min_quorum: MIN_QUORUM,
            max_polled_peers: MAX_POLLED_PEERS,
            allow_forging_without_peers: false,
            epoch: EPOCH,
            block_time: BLOCK_TIME_SECONDS,
            block_version: BLOCK_VERSION,
            max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK as usize,
            milestones: MilestoneSchedule::default(),
        }
    }
}
