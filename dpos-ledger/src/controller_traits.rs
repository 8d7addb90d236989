// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::LedgerResult;
use dpos_models::{Account, AccountDelta, Address};
use dpos_signature::PublicKey;

#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
/// Trait defining a ledger controller
pub trait LedgerController: Send + Sync {
    /// Apply `delta` to the account at `address`, creating it on first reference.
    /// Unconditional: callers check balances beforehand. Returns the account after the merge.
    fn merge(&self, address: &Address, delta: &AccountDelta) -> LedgerResult<Account>;

    /// Account at `address`
    fn get_account(&self, address: &Address) -> LedgerResult<Option<Account>>;

    /// Account owning `public_key`, if the key has been seen
    fn get_account_by_public_key(&self, public_key: &PublicKey)
        -> LedgerResult<Option<Account>>;

    /// Account registered (or registering) under `username`
    fn get_account_by_username(&self, username: &str) -> LedgerResult<Option<Account>>;

    /// Confirmed delegates
    fn get_delegates(&self) -> LedgerResult<Vec<Account>>;

    /// Record the public key of `address` the first time it is seen
    fn set_public_key(&self, address: &Address, public_key: &PublicKey) -> LedgerResult<Account>;

    /// Accounts whose confirmed votes include `public_key`
    fn accounts_voting_for(&self, public_key: &PublicKey) -> LedgerResult<Vec<Account>>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn LedgerController>`.
    fn clone_box(&self) -> Box<dyn LedgerController>;
}

/// Allow cloning `Box<dyn LedgerController>`
/// Uses `LedgerController::clone_box` internally
impl Clone for Box<dyn LedgerController> {
    fn clone(&self) -> Box<dyn LedgerController> {
        self.clone_box()
    }
}
