// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! DEFAULT VALUES USED TO INITIALIZE DIVERS CONFIGURATIONS STRUCTURES
//!
//! These are the network parameters of the chain. Changing one of them is a
//! breaking change: blocks and transactions produced with other values will not
//! verify. They are passed by dependency injection in the `cfg` of each worker,
//! which lets unit tests shrink them (fewer delegates, shorter slots).

use crate::amount::Amount;
use dpos_time::DposTime;

/// Number of delegates forging in each round
pub const ACTIVE_DELEGATES: usize = 51;
/// Duration of a slot in seconds
pub const BLOCK_TIME_SECONDS: u32 = 8;
/// Chain epoch: 2017-03-21T13:00:00Z. Transaction and block timestamps count seconds from it.
pub const EPOCH: DposTime = DposTime::from_millis(1_490_101_200_000);
/// Version byte prefixed to address payloads. Must not be 0x02 or 0x03 (compressed key prefixes).
pub const ADDRESS_VERSION: u8 = 0x17;
/// Number of base units in one coin
pub const AMOUNT_DECIMAL_FACTOR: u64 = 100_000_000;
/// Total supply created by the genesis block
pub const TOTAL_SUPPLY: Amount = Amount::from_raw(12_500_000_000_000_000);
/// Supported block version
pub const BLOCK_VERSION: u32 = 0;
/// Maximum number of transactions in a block
pub const MAX_TRANSACTIONS_PER_BLOCK: u32 = 50;
/// Maximum cumulated byte size of the transactions of a block
pub const MAX_PAYLOAD_LENGTH: u32 = 1024 * 1024;
/// Maximum size of the vendor field in bytes
pub const MAX_VENDOR_FIELD_LENGTH: usize = 64;
/// Maximum length of a delegate username
pub const MAX_USERNAME_LENGTH: usize = 20;
/// Maximum number of vote entries in one vote transaction
pub const MAX_VOTES_PER_TRANSACTION: usize = 33;
/// Maximum number of delegates an account may vote for
pub const MAX_VOTES_PER_ACCOUNT: usize = ACTIVE_DELEGATES;
/// Bounds of a multisignature keysgroup size
pub const MULTISIGNATURE_KEYS: (usize, usize) = (1, 15);
/// Bounds of a multisignature lifetime in hours
pub const MULTISIGNATURE_LIFETIME: (u8, u8) = (1, 72);

/// Minimum fee of a transfer
pub const TRANSFER_FEE: Amount = Amount::from_raw(10_000_000);
/// Minimum fee of a second signature registration
pub const SECOND_SIGNATURE_FEE: Amount = Amount::from_raw(500_000_000);
/// Minimum fee of a delegate registration
pub const DELEGATE_FEE: Amount = Amount::from_raw(2_500_000_000);
/// Minimum fee of a vote
pub const VOTE_FEE: Amount = Amount::from_raw(100_000_000);
/// Minimum fee of a multisignature registration, per key (keysgroup size + 1)
pub const MULTISIGNATURE_FEE: Amount = Amount::from_raw(500_000_000);

/// Height from which blocks are rewarded
pub const REWARD_OFFSET: u32 = 1_451_520;
/// Number of blocks between two reward milestones
pub const REWARD_DISTANCE: u32 = 3_000_000;
/// Reward of each milestone
pub const REWARD_MILESTONES: [Amount; 5] = [
    Amount::from_raw(500_000_000),
    Amount::from_raw(400_000_000),
    Amount::from_raw(300_000_000),
    Amount::from_raw(200_000_000),
    Amount::from_raw(100_000_000),
];

/// Number of heights kept in the chain state cache
pub const BLOCK_CACHE_SIZE: usize = 200;
/// Pending transactions older than this many seconds expire
pub const TRANSACTION_TIMEOUT_SECONDS: u64 = 10_800;
/// Expiry multiplier for transactions carrying co-signatures
pub const SIGNED_TRANSACTION_TIMEOUT_FACTOR: u64 = 8;
/// Maximum number of transactions in each mempool sub-pool
pub const MAX_TRANSACTIONS_PER_QUEUE: usize = 1000;
/// Maximum number of multisignature transactions promoted by one fill
pub const MAX_MULTISIGNATURE_FILL: usize = 5;
/// Maximum number of bundled transactions re-verified in one pass
pub const BUNDLE_LIMIT: usize = 25;

/// Fraction of polled peers that must agree with the local chain before forging
pub const MIN_QUORUM: f64 = 0.66;
/// Maximum number of peers polled by the quorum gate
pub const MAX_POLLED_PEERS: usize = 20;
