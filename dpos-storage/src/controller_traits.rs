// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::StorageResult;
use dpos_models::{Account, Address, Block, BlockId, RoundSnapshot, TransactionId};
use dpos_signature::PublicKey;

#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
/// Row-level access to the persisted state
pub trait StorageController: Send + Sync {
    /// Account stored at `address`
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>>;

    /// Account whose public key is known to be `public_key`
    fn get_account_by_public_key(&self, public_key: &PublicKey)
        -> StorageResult<Option<Account>>;

    /// Account whose username is `username`, confirmed registrations first,
    /// then pending ones
    fn get_account_by_username(&self, username: &str) -> StorageResult<Option<Account>>;

    /// All accounts, ordered by address
    fn get_accounts(&self) -> StorageResult<Vec<Account>>;

    /// Insert or replace an account row
    fn save_account(&self, account: Account) -> StorageResult<()>;

    /// Atomically store a block header, its raw transactions and the transaction index.
    /// Nothing is written if any part conflicts with stored data.
    fn save_block(&self, block: &Block) -> StorageResult<()>;

    /// Remove the last block together with its transactions
    fn delete_block(&self, block_id: &BlockId) -> StorageResult<()>;

    /// Block with its transactions
    fn get_block(&self, block_id: &BlockId) -> StorageResult<Option<Block>>;

    /// Block stored at `height`
    fn get_block_at_height(&self, height: u32) -> StorageResult<Option<Block>>;

    /// Highest stored block
    fn get_last_block(&self) -> StorageResult<Option<Block>>;

    /// Up to `limit` blocks above `height`, in height order
    fn get_blocks_after(&self, height: u32, limit: usize) -> StorageResult<Vec<Block>>;

    /// Whether a block is stored
    fn block_exists(&self, block_id: &BlockId) -> StorageResult<bool>;

    /// Whether a transaction is confirmed
    fn transaction_exists(&self, transaction_id: &TransactionId) -> StorageResult<bool>;

    /// Persist the snapshot of a round start
    fn save_round_snapshot(&self, snapshot: RoundSnapshot) -> StorageResult<()>;

    /// Snapshot of a round start
    fn get_round_snapshot(&self, round: u64) -> StorageResult<Option<RoundSnapshot>>;

    /// Drop the snapshot of a round start
    fn delete_round_snapshot(&self, round: u64) -> StorageResult<()>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn StorageController>`.
    fn clone_box(&self) -> Box<dyn StorageController>;
}

/// Allow cloning `Box<dyn StorageController>`
/// Uses `StorageController::clone_box` internally
impl Clone for Box<dyn StorageController> {
    fn clone(&self) -> Box<dyn StorageController> {
        self.clone_box()
    }
}
