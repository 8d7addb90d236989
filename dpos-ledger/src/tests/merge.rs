// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{Ledger, LedgerController, LedgerError};
use dpos_models::{AccountDelta, Address, BlockId, BlockTag, FieldChange, SetEntry};
use dpos_signature::KeyPair;
use dpos_storage::{MemoryStorage, MockStorageController, StorageController};

fn address_of(passphrase: &str) -> (KeyPair, Address) {
    let keypair = KeyPair::from_passphrase(passphrase).unwrap();
    let address = Address::from_public_key(&keypair.get_public_key(), 0x17);
    (keypair, address)
}

#[test]
fn test_merge_creates_account() {
    let ledger = Ledger::new(Box::new(MemoryStorage::new()));
    let (_, address) = address_of("new account");
    assert!(ledger.get_account(&address).unwrap().is_none());
    let account = ledger
        .merge(&address, &AccountDelta::balances(1_000))
        .unwrap();
    assert_eq!(account.balance, 1_000);
    assert_eq!(account.u_balance, 1_000);
    assert_eq!(ledger.get_account(&address).unwrap(), Some(account));
}

#[test]
fn test_merge_then_negation_restores_account() {
    let ledger = Ledger::new(Box::new(MemoryStorage::new()));
    let (keypair, address) = address_of("restored");
    let delegate = KeyPair::from_passphrase("voted").unwrap().get_public_key();
    let cosigner = KeyPair::from_passphrase("cosigner").unwrap().get_public_key();
    ledger
        .merge(
            &address,
            &AccountDelta {
                balance: 500,
                u_balance: 400,
                ..Default::default()
            },
        )
        .unwrap();
    ledger
        .set_public_key(&address, &keypair.get_public_key())
        .unwrap();
    let before = ledger.get_account(&address).unwrap().unwrap();

    let delta = AccountDelta {
        balance: -120,
        u_balance: -80,
        vote: 7,
        rewards: 3,
        fees: 2,
        produced_blocks: 1,
        missed_blocks: 2,
        delegates: vec![SetEntry::add(delegate)],
        u_multisignatures: vec![SetEntry::add(cosigner)],
        second_signature: FieldChange::set(false, true),
        second_public_key: FieldChange::set(None, Some(cosigner)),
        is_delegate: FieldChange::set(false, true),
        username: FieldChange::set(None, Some("restored".to_string())),
        u_multimin: FieldChange::set(0, 1),
        u_multilifetime: FieldChange::set(0, 24),
        ..Default::default()
    };
    let after = ledger.merge(&address, &delta).unwrap();
    assert_eq!(after.balance, 380);
    assert_eq!(after.delegates, vec![delegate]);
    assert_eq!(after.username.as_deref(), Some("restored"));
    assert!(after.second_signature);

    let restored = ledger.merge(&address, &delta.negated()).unwrap();
    assert_eq!(restored, before);
}

#[test]
fn test_tagged_removal_then_negation_restores_account() {
    let ledger = Ledger::new(Box::new(MemoryStorage::new()));
    let (_, address) = address_of("tagged");
    let first = KeyPair::from_passphrase("first vote").unwrap().get_public_key();
    let second = KeyPair::from_passphrase("second vote").unwrap().get_public_key();
    ledger
        .merge(
            &address,
            &AccountDelta {
                delegates: vec![SetEntry::add(second), SetEntry::add(first)],
                ..Default::default()
            },
        )
        .unwrap();
    let before = ledger.get_account(&address).unwrap().unwrap();
    let mut sorted = vec![first, second];
    sorted.sort();
    assert_eq!(before.delegates, sorted);

    let removed = sorted[0];
    let tag = BlockTag {
        block_id: BlockId::new(42),
        round: 4,
        genesis: false,
    };
    let delta = AccountDelta {
        balance: 5,
        delegates: vec![SetEntry::remove(removed)],
        ..Default::default()
    }
    .tagged(Some(tag));
    let after = ledger.merge(&address, &delta).unwrap();
    assert_eq!(after.delegates, vec![sorted[1]]);

    let restored = ledger.merge(&address, &delta.negated()).unwrap();
    assert_eq!(restored, before);
}

#[test]
fn test_merge_overflow_leaves_account_untouched() {
    let ledger = Ledger::new(Box::new(MemoryStorage::new()));
    let (_, address) = address_of("overflow");
    ledger
        .merge(&address, &AccountDelta::balances(i64::MAX))
        .unwrap();
    let result = ledger.merge(
        &address,
        &AccountDelta {
            balance: 1,
            missed_blocks: 1,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(LedgerError::Overflow { .. })));
    let account = ledger.get_account(&address).unwrap().unwrap();
    assert_eq!(account.balance, i64::MAX);
    assert_eq!(account.missed_blocks, 0);
}

#[test]
fn test_negative_counter_is_rejected() {
    let ledger = Ledger::new(Box::new(MemoryStorage::new()));
    let (_, address) = address_of("counter");
    let result = ledger.merge(
        &address,
        &AccountDelta {
            produced_blocks: -1,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(LedgerError::Overflow { .. })));
}

#[test]
fn test_delegates_and_voters() {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(storage.clone_box());
    let (delegate, delegate_address) = address_of("delegate");
    let (_, voter_address) = address_of("voter");
    ledger
        .set_public_key(&delegate_address, &delegate.get_public_key())
        .unwrap();
    ledger
        .merge(
            &delegate_address,
            &AccountDelta {
                is_delegate: FieldChange::set(false, true),
                username: FieldChange::set(None, Some("delegate".to_string())),
                ..Default::default()
            },
        )
        .unwrap();
    ledger
        .merge(
            &voter_address,
            &AccountDelta {
                delegates: vec![SetEntry::add(delegate.get_public_key())],
                ..Default::default()
            },
        )
        .unwrap();

    let delegates = ledger.get_delegates().unwrap();
    assert_eq!(delegates.len(), 1);
    assert_eq!(delegates[0].address, delegate_address);
    let voters = ledger
        .accounts_voting_for(&delegate.get_public_key())
        .unwrap();
    assert_eq!(voters.len(), 1);
    assert_eq!(voters[0].address, voter_address);
    assert_eq!(
        ledger
            .get_account_by_username("delegate")
            .unwrap()
            .map(|account| account.address),
        Some(delegate_address)
    );
    assert_eq!(
        ledger
            .get_account_by_public_key(&delegate.get_public_key())
            .unwrap()
            .map(|account| account.address),
        Some(delegate_address)
    );
}

#[test]
fn test_storage_failure_is_propagated() {
    let mut storage = MockStorageController::new();
    storage.expect_get_account().returning(|_| {
        Err(dpos_storage::StorageError::Unavailable(
            "disk detached".to_string(),
        ))
    });
    storage.expect_save_account().never();
    let ledger = Ledger::new(Box::new(storage));
    let (_, address) = address_of("unavailable");
    let err = ledger
        .merge(&address, &AccountDelta::balances(1))
        .unwrap_err();
    assert_eq!(err.kind(), dpos_models::ErrorKind::Transient);
}
