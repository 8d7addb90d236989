// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{chain, DELEGATES};
use crate::{RoundManager, RoundsConfig, RoundsError};
use assert_matches::assert_matches;
use dpos_models::{Amount, ErrorKind};
use dpos_storage::StorageController;
use std::collections::BTreeSet;

#[test]
fn test_genesis_opens_first_round_from_votes() {
    let mut chain = chain(DELEGATES + 1, DELEGATES);
    assert_eq!(chain.genesis(), Some(1));

    let active: BTreeSet<_> = chain
        .manager
        .active_delegates()
        .unwrap()
        .into_iter()
        .collect();
    let voted: BTreeSet<_> = chain.delegates[..DELEGATES]
        .iter()
        .map(|delegate| delegate.get_public_key())
        .collect();
    assert_eq!(active, voted, "the delegate without votes stays out");

    assert_eq!(chain.account(&chain.delegates[2]).vote, 300);
    assert_eq!(chain.account(&chain.delegates[3]).vote, 0);
    let snapshot = chain.storage.get_round_snapshot(1).unwrap().unwrap();
    assert_eq!(snapshot.delegates.len(), DELEGATES);
    assert_eq!(snapshot.opening_deltas.len(), DELEGATES);
}

#[test]
fn test_ties_ranked_by_public_key() {
    // nobody votes: every weight is zero, the lowest keys win
    let mut chain = chain(DELEGATES + 2, 0);
    chain.genesis();
    let mut expected: Vec<_> = chain
        .delegates
        .iter()
        .map(|delegate| delegate.get_public_key())
        .collect();
    expected.sort();
    expected.truncate(DELEGATES);
    let mut active = chain.manager.active_delegates().unwrap();
    active.sort();
    assert_eq!(active, expected);
}

#[test]
fn test_round_close_counts_and_rewards() {
    let mut chain = chain(DELEGATES, DELEGATES);
    chain.genesis();
    let active = chain.manager.active_delegates().unwrap();
    let first = chain.keypair_of(&active[0]).clone();
    let second = chain.keypair_of(&active[1]).clone();
    let idle = chain.keypair_of(&active[2]).clone();
    let balance_before = chain.account(&first).balance;

    assert_eq!(chain.tick(&first, Amount::from_raw(500)), None);
    assert_eq!(chain.manager.get_slot_delegate(0).unwrap(), active[0]);
    assert_eq!(chain.tick(&second, Amount::from_raw(500)), Some(2));

    let first_account = chain.account(&first);
    assert_eq!(first_account.balance, balance_before + 500);
    assert_eq!(first_account.rewards, 500);
    assert_eq!(first_account.produced_blocks, 1);
    assert_eq!(chain.account(&second).produced_blocks, 1);
    assert_eq!(chain.account(&idle).missed_blocks, 1);
    assert_eq!(chain.account(&idle).produced_blocks, 0);
    assert!(chain.storage.get_round_snapshot(2).unwrap().is_some());
    assert_eq!(chain.manager.current_round(), 2);

    let stats = chain
        .manager
        .get_forging_stats(&first.get_public_key())
        .unwrap()
        .unwrap();
    assert_eq!(stats.productivity, 100.0);
    let stats = chain
        .manager
        .get_forging_stats(&idle.get_public_key())
        .unwrap()
        .unwrap();
    assert_eq!(stats.productivity, 0.0);
}

#[test]
fn test_backward_tick_inverts_round_close() {
    let mut chain = chain(DELEGATES + 1, DELEGATES + 1);
    chain.genesis();
    let active = chain.manager.active_delegates().unwrap();
    let first = chain.keypair_of(&active[0]).clone();
    let second = chain.keypair_of(&active[1]).clone();
    chain.tick(&first, Amount::from_raw(700));
    let before_close = chain.fingerprint();

    assert_eq!(chain.tick(&second, Amount::from_raw(700)), Some(2));
    assert_ne!(chain.fingerprint(), before_close);

    assert_eq!(chain.pop(), Some(2));
    assert_eq!(chain.fingerprint(), before_close);
    assert!(chain.storage.get_round_snapshot(2).unwrap().is_none());
    assert_eq!(chain.manager.current_round(), 1);
    assert_eq!(chain.manager.active_delegates().unwrap(), active);

    // the same block closes the round again with the same outcome
    assert_eq!(chain.tick(&second, Amount::from_raw(700)), Some(2));
    chain.pop();
    assert_eq!(chain.fingerprint(), before_close);
}

#[test]
fn test_removing_first_block_of_round_reloads_snapshot() {
    let mut chain = chain(DELEGATES, DELEGATES);
    chain.genesis();
    let round_one = chain.manager.active_delegates().unwrap();
    for index in 0..2 {
        let forger = chain.keypair_of(&round_one[index]).clone();
        chain.tick(&forger, Amount::zero());
    }
    let round_two = chain.manager.active_delegates().unwrap();
    let before = chain.fingerprint();

    let forger = chain.keypair_of(&round_two[1]).clone();
    assert_eq!(chain.tick(&forger, Amount::from_raw(42)), None);
    assert_eq!(chain.manager.fee_pool(), Amount::zero());
    assert_eq!(chain.pop(), None);
    assert_eq!(chain.fingerprint(), before);
    assert_eq!(chain.manager.active_delegates().unwrap(), round_two);
}

#[test]
fn test_load_restores_round() {
    let mut chain = chain(DELEGATES, DELEGATES);
    chain.genesis();
    let active = chain.manager.active_delegates().unwrap();
    let forger = chain.keypair_of(&active[0]).clone();
    chain.tick(&forger, Amount::zero());

    let mut reloaded = RoundManager::new(
        RoundsConfig {
            delegates: DELEGATES,
            ..Default::default()
        },
        Box::new(chain.ledger.clone()),
        Box::new(chain.storage.clone()),
    );
    reloaded.load(2).unwrap();
    assert_eq!(reloaded.active_delegates().unwrap(), active);
    assert_eq!(reloaded.current_round(), 1);

    // the reloaded manager closes the round like the original would
    let block = dpos_models::Block::new_signed(
        &forger,
        0,
        24,
        Some((chain.blocks[1].id, 2)),
        Vec::new(),
        Amount::zero(),
    )
    .unwrap();
    chain.storage.save_block(&block).unwrap();
    assert_eq!(reloaded.tick(&block).unwrap(), Some(2));
    assert_eq!(chain.account(&forger).produced_blocks, 2);
}

#[test]
fn test_genesis_can_not_be_removed() {
    let mut chain = chain(DELEGATES, DELEGATES);
    chain.genesis();
    let genesis = chain.blocks[0].clone();
    let err = chain.manager.backward_tick(&genesis).unwrap_err();
    assert_matches!(err, RoundsError::CannotRevertGenesis);
}

#[test]
fn test_not_enough_delegates() {
    let mut chain = chain(DELEGATES - 1, DELEGATES - 1);
    let source = dpos_signature::KeyPair::from_passphrase("lonely source").unwrap();
    let genesis =
        dpos_models::Block::new_signed(&source, 0, 0, None, Vec::new(), Amount::zero()).unwrap();
    let err = chain.manager.tick(&genesis).unwrap_err();
    assert_matches!(err, RoundsError::NotEnoughDelegates { found: 2, required: 3 });
    assert_eq!(err.kind(), ErrorKind::Fatal);
    assert!(chain.storage.get_round_snapshot(1).unwrap().is_none());
}

#[test]
fn test_shuffle_depends_on_round() {
    let keys: Vec<_> = (0..20)
        .map(|index| {
            dpos_signature::KeyPair::from_passphrase(&format!("shuffled {}", index))
                .unwrap()
                .get_public_key()
        })
        .collect();
    let first = crate::shuffle_delegates(1, keys.clone());
    let second = crate::shuffle_delegates(2, keys.clone());
    assert_ne!(first, second);
    assert_eq!(first, crate::shuffle_delegates(1, keys));
}
