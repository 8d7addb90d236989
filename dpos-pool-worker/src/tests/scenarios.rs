// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{coins, keypair, pool_test};
use crate::start_pool_controller;
use assert_matches::assert_matches;
use dpos_ledger::LedgerController;
use dpos_models::{AccountDelta, ErrorKind};
use dpos_pool_exports::{PoolConfig, PoolController, PoolError, PoolKind, PoolStats};
use dpos_sequence::{start_sequence, SequenceConfig};
use dpos_signature::KeyPair;
use dpos_time::DposTime;
use dpos_transactions::TransactionError;
use serial_test::serial;
use std::thread::sleep;
use std::time::{Duration, Instant};

fn stats(unconfirmed: usize, queued: usize, multisignature: usize, bundled: usize) -> PoolStats {
    PoolStats {
        unconfirmed,
        queued,
        multisignature,
        bundled,
    }
}

#[test]
fn test_admission_routes_by_kind() {
    let test = pool_test(PoolConfig::default());
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    test.fund(&sender, coins(1_000));

    let ordinary = test.transfer(&sender, &recipient, 1);
    test.controller
        .add_transaction(ordinary.clone(), false)
        .unwrap();
    let members: Vec<KeyPair> = (0..2).map(|i| keypair(&format!("member {}", i))).collect();
    let registration = test.register_multisignature(&sender, 2, &members);
    test.controller
        .add_transaction(registration.clone(), false)
        .unwrap();
    let bundled = test.transfer(&sender, &recipient, 2);
    test.controller.add_transaction(bundled.clone(), true).unwrap();

    assert_eq!(test.controller.get_stats(), stats(0, 1, 1, 1));
    for id in [&ordinary.id, &registration.id, &bundled.id] {
        assert!(test.controller.transaction_in_pool(id));
    }
    assert_eq!(
        test.controller.get_transaction(&ordinary.id),
        Some(ordinary.clone())
    );

    let duplicate = test.controller.add_transaction(ordinary, true);
    assert_matches!(duplicate, Err(PoolError::AlreadyInPool(_)));
    assert_eq!(duplicate.unwrap_err().kind(), ErrorKind::Conflict);
}

#[test]
fn test_unknown_sender_is_refused() {
    let test = pool_test(PoolConfig::default());
    let stranger = test.transfer(&keypair("stranger"), &keypair("recipient"), 1);
    assert_matches!(
        test.controller.add_transaction(stranger, false),
        Err(PoolError::TransactionError(TransactionError::UnknownSender(_)))
    );
    assert_eq!(test.controller.get_stats().total(), 0);
}

#[test]
fn test_fill_promotes_in_receipt_order() {
    let test = pool_test(PoolConfig::default());
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    let address = test.fund(&sender, coins(100));

    let transactions: Vec<_> = [3, 1, 2]
        .iter()
        .map(|units| test.transfer(&sender, &recipient, *units))
        .collect();
    let accepted = test
        .controller
        .receive_transactions(transactions.clone(), false);
    assert_eq!(accepted, 3);
    assert!(test.controller.get_block_transactions(10).is_empty());

    assert_eq!(test.controller.fill_pool().unwrap(), 3);
    assert_eq!(test.controller.get_stats(), stats(3, 0, 0, 0));
    assert_eq!(test.controller.get_block_transactions(10), transactions);
    assert_eq!(
        test.controller.get_block_transactions(2),
        transactions[..2].to_vec()
    );

    let spent: i64 = transactions
        .iter()
        .map(|transaction| transaction.total_cost().unwrap().to_signed())
        .sum();
    let account = test.account(&address);
    assert_eq!(account.balance, coins(100).to_signed());
    assert_eq!(account.u_balance, coins(100).to_signed() - spent);
}

#[test]
fn test_fill_respects_block_capacity() {
    let test = pool_test(PoolConfig {
        max_transactions_per_block: 2,
        ..PoolConfig::default()
    });
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    test.fund(&sender, coins(100));
    for units in 1..=3 {
        test.controller
            .add_transaction(test.transfer(&sender, &recipient, units), false)
            .unwrap();
    }

    assert_eq!(test.controller.fill_pool().unwrap(), 2);
    assert_eq!(test.controller.get_stats(), stats(2, 1, 0, 0));
    assert_eq!(test.controller.fill_pool().unwrap(), 0);
}

#[test]
fn test_queue_capacity() {
    let test = pool_test(PoolConfig {
        max_transactions_per_queue: 1,
        ..PoolConfig::default()
    });
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    test.fund(&sender, coins(100));
    test.controller
        .add_transaction(test.transfer(&sender, &recipient, 1), false)
        .unwrap();

    let refused = test
        .controller
        .add_transaction(test.transfer(&sender, &recipient, 2), false);
    assert_matches!(
        refused,
        Err(PoolError::Full {
            pool: PoolKind::Queued,
            capacity: 1
        })
    );
    assert_eq!(refused.unwrap_err().kind(), ErrorKind::Transient);
}

#[test]
fn test_multisignature_waits_for_cosignatures() {
    let test = pool_test(PoolConfig::default());
    let owner = keypair("multisig owner");
    let members: Vec<KeyPair> = (0..5).map(|i| keypair(&format!("member {}", i))).collect();
    test.fund(&owner, coins(1_000));

    let registration = test.register_multisignature(&owner, 3, &members);
    let id = registration.id;
    test.controller
        .add_transaction(registration.clone(), false)
        .unwrap();
    assert_eq!(test.controller.fill_pool().unwrap(), 0);

    for member in &members[..2] {
        test.controller
            .add_signature(id, registration.cosign(member).unwrap())
            .unwrap();
        assert_eq!(test.controller.fill_pool().unwrap(), 0);
    }
    assert_matches!(
        test.controller
            .add_signature(id, registration.cosign(&members[0]).unwrap()),
        Err(PoolError::DuplicateSignature(_))
    );
    assert_matches!(
        test.controller
            .add_signature(id, registration.cosign(&keypair("intruder")).unwrap()),
        Err(PoolError::TransactionError(
            TransactionError::InvalidCosignatures(_)
        ))
    );

    test.controller
        .add_signature(id, registration.cosign(&members[2]).unwrap())
        .unwrap();
    assert_eq!(test.controller.fill_pool().unwrap(), 1);
    let promoted = test.controller.get_block_transactions(1);
    assert_eq!(promoted[0].signatures.len(), 3);

    assert_matches!(
        test.controller
            .add_signature(id, registration.cosign(&members[3]).unwrap()),
        Err(PoolError::NotPending(_))
    );
}

#[test]
fn test_timeouts_by_kind() {
    let config = PoolConfig::default();
    let test = pool_test(config.clone());
    let owner = keypair("owner");
    let members = vec![keypair("member")];
    let pool = test.controller.pool.read();

    let ordinary = test.transfer(&owner, &keypair("recipient"), 1);
    assert_eq!(pool.timeout(&ordinary), config.transaction_timeout);

    let mut cosigned = ordinary.clone();
    cosigned
        .signatures
        .push(cosigned.cosign(&members[0]).unwrap());
    assert_eq!(
        pool.timeout(&cosigned),
        config
            .transaction_timeout
            .saturating_mul(config.signed_transaction_timeout_factor)
    );

    let registration = test.register_multisignature(&owner, 1, &members);
    assert_eq!(pool.timeout(&registration), DposTime::from_secs(24 * 3600));
}

#[test]
fn test_expiry_undoes_unconfirmed_effects() {
    let config = PoolConfig::default();
    let test = pool_test(config.clone());
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    let address = test.fund(&sender, coins(100));
    let transaction = test.transfer(&sender, &recipient, 5);
    test.controller
        .add_transaction(transaction.clone(), false)
        .unwrap();
    test.controller.fill_pool().unwrap();
    assert!(test.account(&address).u_balance < coins(100).to_signed());

    assert!(test.controller.expire_transactions().unwrap().is_empty());

    let later = DposTime::now()
        .unwrap()
        .saturating_add(config.transaction_timeout)
        .saturating_add(DposTime::from_secs(1));
    assert_eq!(
        test.controller.expire_at(later).unwrap(),
        vec![transaction.id]
    );
    assert_eq!(test.controller.get_stats().total(), 0);
    assert_eq!(test.account(&address).u_balance, coins(100).to_signed());
}

#[test]
fn test_undo_then_apply_unconfirmed_list() {
    let test = pool_test(PoolConfig::default());
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    let address = test.fund(&sender, coins(100));
    let transactions: Vec<_> = (1..=2)
        .map(|units| test.transfer(&sender, &recipient, units))
        .collect();
    test.controller.receive_transactions(transactions.clone(), false);
    test.controller.fill_pool().unwrap();
    let applied = test.account(&address).u_balance;

    let undone = test.controller.undo_unconfirmed_list().unwrap();
    assert_eq!(undone, vec![transactions[1].id, transactions[0].id]);
    assert_eq!(test.account(&address).u_balance, coins(100).to_signed());
    assert!(test.controller.get_block_transactions(10).is_empty());
    assert_eq!(test.controller.get_stats(), stats(2, 0, 0, 0));

    assert!(test.controller.apply_unconfirmed_list().unwrap().is_empty());
    assert_eq!(test.account(&address).u_balance, applied);
    assert_eq!(test.controller.get_block_transactions(10), transactions);
}

#[test]
fn test_apply_unconfirmed_list_drops_unaffordable() {
    let test = pool_test(PoolConfig::default());
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    let address = test.fund(&sender, coins(10));
    let transaction = test.transfer(&sender, &recipient, 5);
    test.controller
        .add_transaction(transaction.clone(), false)
        .unwrap();
    test.controller.fill_pool().unwrap();
    test.controller.undo_unconfirmed_list().unwrap();

    // the sender spends its coins in a block meanwhile
    test.ledger
        .merge(&address, &AccountDelta::balances(-coins(9).to_signed()))
        .unwrap();
    assert_eq!(
        test.controller.apply_unconfirmed_list().unwrap(),
        vec![transaction.id]
    );
    assert!(!test.controller.transaction_in_pool(&transaction.id));
    assert_eq!(test.account(&address).u_balance, coins(1).to_signed());
}

#[test]
fn test_process_bundled() {
    let test = pool_test(PoolConfig {
        bundle_limit: 1,
        ..PoolConfig::default()
    });
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    test.fund(&sender, coins(100));
    let valid = test.transfer(&sender, &recipient, 1);
    let unfunded = test.transfer(&keypair("stranger"), &recipient, 1);
    let accepted = test
        .controller
        .receive_transactions(vec![unfunded.clone(), valid.clone()], true);
    assert_eq!(accepted, 2);

    assert_eq!(test.controller.process_bundled().unwrap(), 0);
    assert!(!test.controller.transaction_in_pool(&unfunded.id));
    assert_eq!(test.controller.get_stats(), stats(0, 0, 0, 1));

    assert_eq!(test.controller.process_bundled().unwrap(), 1);
    assert_eq!(test.controller.get_stats(), stats(0, 1, 0, 0));
}

#[test]
fn test_remove_and_return_transactions() {
    let test = pool_test(PoolConfig::default());
    let sender = keypair("sender");
    let recipient = keypair("recipient");
    let address = test.fund(&sender, coins(100));
    let transaction = test.transfer(&sender, &recipient, 5);
    test.controller
        .add_transaction(transaction.clone(), false)
        .unwrap();
    test.controller.fill_pool().unwrap();

    test.controller.remove_transactions(vec![transaction.id]);
    assert_eq!(test.controller.get_stats().total(), 0);
    assert_eq!(test.account(&address).u_balance, coins(100).to_signed());

    assert_eq!(
        test.controller.return_transactions(vec![transaction.clone()]),
        1
    );
    assert_eq!(test.controller.get_stats(), stats(0, 1, 0, 0));
}

#[test]
#[serial]
fn test_worker_verifies_bundles_periodically() {
    let storage = dpos_storage::MemoryStorage::new();
    let ledger = dpos_ledger::Ledger::new(Box::new(storage.clone()));
    let engine = dpos_transactions::TransactionEngine::new(
        Default::default(),
        Box::new(ledger.clone()),
        Box::new(storage),
    );
    let (balances, mut sequence_manager) =
        start_sequence(SequenceConfig::new("balances", 1_000)).unwrap();
    let (mut manager, controller) = start_pool_controller(
        PoolConfig {
            bundle_interval: DposTime::from_millis(10),
            ..PoolConfig::default()
        },
        engine.clone(),
        balances,
    )
    .unwrap();

    let sender = keypair("sender");
    let address = dpos_models::Address::from_public_key(
        &sender.get_public_key(),
        engine.config().address_version,
    );
    ledger
        .merge(&address, &AccountDelta::balances(coins(100).to_signed()))
        .unwrap();
    let transaction = engine
        .create(
            &dpos_transactions::TransactionRequest::transfer(address, coins(1), 0),
            &sender,
            None,
        )
        .unwrap();
    controller.add_transaction(transaction, true).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.get_stats() != stats(1, 0, 0, 0) {
        assert!(Instant::now() < deadline, "bundle never promoted");
        sleep(Duration::from_millis(10));
    }
    manager.stop();
    sequence_manager.stop();
}
