// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::controller_traits::LedgerController;
use crate::error::{LedgerError, LedgerResult};
use dpos_models::{Account, AccountDelta, Address, SetAction, SetEntry};
use dpos_signature::PublicKey;
use dpos_storage::StorageController;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Ledger backed by a `StorageController`.
///
/// Merges are read-modify-write cycles on one row: they are serialized by an internal lock so
/// that clones of the ledger can be used from several threads.
#[derive(Clone)]
pub struct Ledger {
    storage: Box<dyn StorageController>,
    merge_lock: Arc<Mutex<()>>,
}

impl Ledger {
    /// Ledger over `storage`
    pub fn new(storage: Box<dyn StorageController>) -> Self {
        Ledger {
            storage,
            merge_lock: Arc::new(Mutex::new(())),
        }
    }
}

fn add_signed(
    value: i64,
    delta: i64,
    address: &Address,
    field: &'static str,
) -> LedgerResult<i64> {
    value.checked_add(delta).ok_or_else(|| LedgerError::Overflow {
        address: address.to_string(),
        field,
    })
}

fn add_counter(
    value: u64,
    delta: i64,
    address: &Address,
    field: &'static str,
) -> LedgerResult<u64> {
    value
        .checked_add_signed(delta)
        .ok_or_else(|| LedgerError::Overflow {
            address: address.to_string(),
            field,
        })
}

/// Sets are kept sorted, so a removal followed by the re-addition restores the same list
fn apply_entries(set: &mut Vec<PublicKey>, entries: &[SetEntry]) {
    for entry in entries {
        let position = set.binary_search(&entry.public_key);
        match (entry.action, position) {
            (SetAction::Add, Err(index)) => set.insert(index, entry.public_key),
            (SetAction::Remove, Ok(index)) => {
                set.remove(index);
            }
            _ => {}
        }
    }
}

/// Applies `delta` to a copy of `account`. The copy is only stored if every field succeeded.
fn merged(account: &Account, delta: &AccountDelta) -> LedgerResult<Account> {
    let address = &account.address;
    let mut next = account.clone();
    next.balance = add_signed(next.balance, delta.balance, address, "balance")?;
    next.u_balance = add_signed(next.u_balance, delta.u_balance, address, "u_balance")?;
    next.vote = add_signed(next.vote, delta.vote, address, "vote")?;
    next.rewards = add_signed(next.rewards, delta.rewards, address, "rewards")?;
    next.fees = add_signed(next.fees, delta.fees, address, "fees")?;
    next.produced_blocks = add_counter(
        next.produced_blocks,
        delta.produced_blocks,
        address,
        "produced_blocks",
    )?;
    next.missed_blocks = add_counter(
        next.missed_blocks,
        delta.missed_blocks,
        address,
        "missed_blocks",
    )?;
    apply_entries(&mut next.delegates, &delta.delegates);
    apply_entries(&mut next.u_delegates, &delta.u_delegates);
    apply_entries(&mut next.multisignatures, &delta.multisignatures);
    apply_entries(&mut next.u_multisignatures, &delta.u_multisignatures);
    delta.second_signature.apply_to(&mut next.second_signature);
    delta.u_second_signature.apply_to(&mut next.u_second_signature);
    delta.second_public_key.apply_to(&mut next.second_public_key);
    delta
        .u_second_public_key
        .apply_to(&mut next.u_second_public_key);
    delta.is_delegate.apply_to(&mut next.is_delegate);
    delta.u_is_delegate.apply_to(&mut next.u_is_delegate);
    delta.username.apply_to(&mut next.username);
    delta.u_username.apply_to(&mut next.u_username);
    delta.multimin.apply_to(&mut next.multimin);
    delta.u_multimin.apply_to(&mut next.u_multimin);
    delta.multilifetime.apply_to(&mut next.multilifetime);
    delta.u_multilifetime.apply_to(&mut next.u_multilifetime);
    Ok(next)
}

impl LedgerController for Ledger {
    fn merge(&self, address: &Address, delta: &AccountDelta) -> LedgerResult<Account> {
        let _guard = self.merge_lock.lock();
        let account = self
            .storage
            .get_account(address)?
            .unwrap_or_else(|| Account::new(*address));
        let next = merged(&account, delta)?;
        self.storage.save_account(next.clone())?;
        match delta.tag {
            Some(tag) => debug!(
                "merged into {} for block {} round {}: balance {} -> {}, u_balance {} -> {}",
                address,
                tag.block_id,
                tag.round,
                account.balance,
                next.balance,
                account.u_balance,
                next.u_balance
            ),
            None => debug!(
                "merged into {}: balance {} -> {}, u_balance {} -> {}",
                address, account.balance, next.balance, account.u_balance, next.u_balance
            ),
        }
        Ok(next)
    }

    fn get_account(&self, address: &Address) -> LedgerResult<Option<Account>> {
        Ok(self.storage.get_account(address)?)
    }

    fn get_account_by_public_key(
        &self,
        public_key: &PublicKey,
    ) -> LedgerResult<Option<Account>> {
        Ok(self.storage.get_account_by_public_key(public_key)?)
    }

    fn get_account_by_username(&self, username: &str) -> LedgerResult<Option<Account>> {
        Ok(self.storage.get_account_by_username(username)?)
    }

    fn get_delegates(&self) -> LedgerResult<Vec<Account>> {
        Ok(self
            .storage
            .get_accounts()?
            .into_iter()
            .filter(|account| account.is_delegate)
            .collect())
    }

    fn set_public_key(&self, address: &Address, public_key: &PublicKey) -> LedgerResult<Account> {
        let _guard = self.merge_lock.lock();
        let mut account = self
            .storage
            .get_account(address)?
            .unwrap_or_else(|| Account::new(*address));
        if account.public_key.is_none() {
            account.public_key = Some(*public_key);
            self.storage.save_account(account.clone())?;
        }
        Ok(account)
    }

    fn accounts_voting_for(&self, public_key: &PublicKey) -> LedgerResult<Vec<Account>> {
        Ok(self
            .storage
            .get_accounts()?
            .into_iter()
            .filter(|account| account.delegates.contains(public_key))
            .collect())
    }

    fn clone_box(&self) -> Box<dyn LedgerController> {
        Box::new(self.clone())
    }
}
