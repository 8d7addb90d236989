// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_models::config::constants::{
    BUNDLE_LIMIT, MAX_MULTISIGNATURE_FILL, MAX_TRANSACTIONS_PER_BLOCK, MAX_TRANSACTIONS_PER_QUEUE,
    SIGNED_TRANSACTION_TIMEOUT_FACTOR, TRANSACTION_TIMEOUT_SECONDS,
};
use dpos_time::DposTime;
use serde::{Deserialize, Serialize};

/// Pool configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PoolConfig {
    /// capacity of the queued, multisignature and bundled pools
    pub max_transactions_per_queue: usize,
    /// ready multisignature transactions promoted per fill
    pub max_multisignature_fill: usize,
    /// size of the unconfirmed pool: what one block can carry
    pub max_transactions_per_block: usize,
    /// bundled transactions verified per pass
    pub bundle_limit: usize,
    /// lifetime of an ordinary transaction
    pub transaction_timeout: DposTime,
    /// lifetime multiplier of co-signed transactions
    pub signed_transaction_timeout_factor: u64,
    /// period of the bundled pass
    pub bundle_interval: DposTime,
    /// period of the expiry sweep
    pub expiry_interval: DposTime,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_transactions_per_queue: MAX_TRANSACTIONS_PER_QUEUE,
            max_multisignature_fill: MAX_MULTISIGNATURE_FILL,
            max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK as usize,
            bundle_limit: BUNDLE_LIMIT,
            transaction_timeout: DposTime::from_secs(TRANSACTION_TIMEOUT_SECONDS),
            signed_transaction_timeout_factor: SIGNED_TRANSACTION_TIMEOUT_FACTOR,
            bundle_interval: DposTime::from_millis(5_000),
            expiry_interval: DposTime::from_millis(30_000),
        }
    }
}
