// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_models::config::constants::{
    ADDRESS_VERSION, BLOCK_TIME_SECONDS, EPOCH, MAX_USERNAME_LENGTH, MAX_VOTES_PER_ACCOUNT,
    MAX_VOTES_PER_TRANSACTION, MULTISIGNATURE_KEYS, MULTISIGNATURE_LIFETIME, TOTAL_SUPPLY,
};
use dpos_models::{Amount, ExceptionTable, FeeSchedule, SlotClock};

/// Transaction engine configuration
#[derive(Debug, Clone)]
pub struct TransactionConfig {
    /// minimum fee of each type
    pub fees: FeeSchedule,
    /// upper bound of any amount
    pub total_supply: Amount,
    /// network byte of addresses
    pub address_version: u8,
    /// vote tokens allowed in one transaction
    pub max_votes_per_transaction: usize,
    /// votes an account may hold
    pub max_votes_per_account: usize,
    /// longest delegate name
    pub max_username_length: usize,
    /// bounds of a multisignature keysgroup size
    pub multisignature_keys: (usize, usize),
    /// bounds of a multisignature lifetime, in hours
    pub multisignature_lifetime: (u8, u8),
    /// slot clock, used to reject transactions from the future
    pub slot_clock: SlotClock,
    /// historical exemptions
    pub exceptions: ExceptionTable,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        TransactionConfig {
            fees: FeeSchedule::default(),
            total_supply: TOTAL_SUPPLY,
            address_version: ADDRESS_VERSION,
            max_votes_per_transaction: MAX_VOTES_PER_TRANSACTION,
            max_votes_per_account: MAX_VOTES_PER_ACCOUNT,
            max_username_length: MAX_USERNAME_LENGTH,
            multisignature_keys: MULTISIGNATURE_KEYS,
            multisignature_lifetime: MULTISIGNATURE_LIFETIME,
            slot_clock: SlotClock::new(EPOCH, BLOCK_TIME_SECONDS),
            exceptions: ExceptionTable::default(),
        }
    }
}
