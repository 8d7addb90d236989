// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::PoolResult;
use crate::types::PoolStats;
use dpos_models::{Transaction, TransactionId};
use dpos_signature::Signature;

/// Trait defining a pool controller
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait PoolController: Send + Sync {
    /// Admits one transaction. Bundled transactions are stored unverified.
    fn add_transaction(&self, transaction: Transaction, bundled: bool) -> PoolResult<()>;

    /// Admits a batch received from a peer, returns how many were accepted
    fn receive_transactions(&self, transactions: Vec<Transaction>, bundled: bool) -> usize;

    /// Promotes queued and ready multisignature transactions into the unconfirmed pool,
    /// applying them to the unconfirmed tier. Returns the number promoted.
    fn fill_pool(&self) -> PoolResult<usize>;

    /// Drops every transaction older than its timeout
    fn expire_transactions(&self) -> PoolResult<Vec<TransactionId>>;

    /// Attaches a co-signature to a transaction of the multisignature pool
    fn add_signature(&self, transaction_id: TransactionId, signature: Signature) -> PoolResult<()>;

    /// Verifies up to `bundle_limit` bundled transactions and routes them
    fn process_bundled(&self) -> PoolResult<usize>;

    /// Reverts the unconfirmed effects of the whole unconfirmed pool, newest first
    fn undo_unconfirmed_list(&self) -> PoolResult<Vec<TransactionId>>;

    /// Re-applies the unconfirmed pool after `undo_unconfirmed_list`.
    /// Returns the transactions dropped because they no longer apply.
    fn apply_unconfirmed_list(&self) -> PoolResult<Vec<TransactionId>>;

    /// Forgets transactions included in a block
    fn remove_transactions(&self, transaction_ids: Vec<TransactionId>);

    /// Gives back the transactions of a popped block
    fn return_transactions(&self, transactions: Vec<Transaction>) -> usize;

    /// Whether a transaction sits in any sub-pool
    fn transaction_in_pool(&self, transaction_id: &TransactionId) -> bool;

    /// Pooled transaction by id
    fn get_transaction(&self, transaction_id: &TransactionId) -> Option<Transaction>;

    /// Applied unconfirmed transactions in receipt order, for block creation
    fn get_block_transactions(&self, limit: usize) -> Vec<Transaction>;

    /// Sizes of the sub-pools
    fn get_stats(&self) -> PoolStats;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn PoolController>`.
    fn clone_box(&self) -> Box<dyn PoolController>;
}

/// Allow cloning `Box<dyn PoolController>`
/// Uses `PoolController::clone_box` internally
impl Clone for Box<dyn PoolController> {
    fn clone(&self) -> Box<dyn PoolController> {
        self.clone_box()
    }
}

/// Pool manager used to stop the pool thread
pub trait PoolManager {
    /// Stop the pool thread
    fn stop(&mut self);
}
