// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_models::config::constants::{
    BLOCK_CACHE_SIZE, BLOCK_TIME_SECONDS, BLOCK_VERSION, EPOCH, MAX_PAYLOAD_LENGTH,
    MAX_TRANSACTIONS_PER_BLOCK, TOTAL_SUPPLY,
};
use dpos_models::{Amount, MilestoneSchedule, SlotClock};
use dpos_time::DposTime;
use serde::Deserialize;

/// Content of the genesis block.
///
/// The genesis account transfers `total_amount` to the holder, every delegate registers
/// itself and the holder votes for all of them, which elects the first round.
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisConfig {
    /// secret of the genesis account, which signs the block
    pub passphrase: String,
    /// secret of the account receiving the initial supply
    pub holder_passphrase: String,
    /// initial supply
    pub total_amount: Amount,
    /// epoch time of the genesis block
    pub timestamp: u32,
    /// secrets of the initial delegates, registered as `genesis_<index>`
    pub delegate_passphrases: Vec<String>,
}

/// Consensus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    /// heights kept in the chain state cache
    pub block_cache_size: usize,
    /// supported block version
    pub block_version: u32,
    /// transaction count limit of a block
    pub max_transactions_per_block: usize,
    /// payload size limit of a block, in bytes
    pub max_payload_length: u32,
    /// chain epoch
    pub epoch: DposTime,
    /// slot duration in seconds
    pub block_time: u32,
    /// block reward schedule
    pub milestones: MilestoneSchedule,
    /// relay accepted blocks to peers
    pub broadcast_blocks: bool,
    /// peers a relayed block or transaction batch is sent to
    pub broadcast_fanout: usize,
    /// capacity of the event bus
    pub event_channel_size: usize,
    /// blocks requested per call when syncing from a peer
    pub sync_batch_size: usize,
    /// blocks that may be removed to join a peer's chain
    pub max_rewind: u32,
    /// depth of the blocks queue above which a warning is logged
    pub queue_warning_threshold: usize,
    /// genesis block content
    pub genesis: GenesisConfig,
}

impl ConsensusConfig {
    /// Slot clock of the chain
    pub fn slot_clock(&self) -> SlotClock {
        SlotClock::new(self.epoch, self.block_time)
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        GenesisConfig {
            passphrase: "genesis".into(),
            holder_passphrase: "genesis holder".into(),
            total_amount: TOTAL_SUPPLY,
            timestamp: 0,
            delegate_passphrases: Vec::new(),
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            block_cache_size: BLOCK_CACHE_SIZE,
            block_version: BLOCK_VERSION,
            max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK as usize,
            max_payload_length: MAX_PAYLOAD_LENGTH,
            epoch: EPOCH,
            block_time: BLOCK_TIME_SECONDS,
            milestones: MilestoneSchedule::default(),
            broadcast_blocks: true,
            broadcast_fanout: 25,
            event_channel_size: 1024,
            sync_batch_size: 34,
            max_rewind: 51,
            queue_warning_threshold: 100,
            genesis: GenesisConfig::default(),
        }
    }
}
