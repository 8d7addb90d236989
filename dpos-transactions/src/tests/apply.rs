// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{address, coins, confirm, context, fund, keypair, tag, transfer};
use crate::TransactionError;
use assert_matches::assert_matches;
use dpos_ledger::LedgerController;
use dpos_models::{BlockTag, BlockId};

#[test]
fn test_transfer_moves_coins_on_both_tiers() {
    let context = context();
    let sender = keypair("apply sender");
    let recipient = keypair("apply recipient");
    let sender_address = fund(&context, &sender, coins(100).to_signed());
    let recipient_address = address(&context, &recipient);

    let transaction = transfer(&context, &sender, &recipient, coins(10));
    let cost = transaction.total_cost().unwrap().to_signed();

    context.engine.apply_unconfirmed(&transaction, false).unwrap();
    let pending = context.ledger.get_account(&sender_address).unwrap().unwrap();
    assert_eq!(pending.u_balance, coins(100).to_signed() - cost);
    assert_eq!(pending.balance, coins(100).to_signed());
    assert_eq!(pending.public_key, Some(sender.get_public_key()));

    context.engine.apply(&transaction, tag(7)).unwrap();
    let sent = context.ledger.get_account(&sender_address).unwrap().unwrap();
    assert_eq!(sent.balance, coins(100).to_signed() - cost);
    let received = context
        .ledger
        .get_account(&recipient_address)
        .unwrap()
        .unwrap();
    assert_eq!(received.balance, coins(10).to_signed());
    assert_eq!(received.u_balance, coins(10).to_signed());
}

#[test]
fn test_undo_restores_accounts() {
    let context = context();
    let sender = keypair("undo sender");
    let recipient = keypair("undo recipient");
    let sender_address = fund(&context, &sender, coins(100).to_signed());
    let recipient_address = fund(&context, &recipient, coins(3).to_signed());
    context
        .ledger
        .set_public_key(&sender_address, &sender.get_public_key())
        .unwrap();
    let transaction = transfer(&context, &sender, &recipient, coins(10));

    context.engine.apply_unconfirmed(&transaction, false).unwrap();
    context.engine.apply(&transaction, tag(3)).unwrap();
    let applied_sender = context.ledger.get_account(&sender_address).unwrap().unwrap();

    context.engine.undo(&transaction, tag(3)).unwrap();
    context.engine.undo_unconfirmed(&transaction).unwrap();
    let sender_account = context.ledger.get_account(&sender_address).unwrap().unwrap();
    let recipient_account = context
        .ledger
        .get_account(&recipient_address)
        .unwrap()
        .unwrap();
    assert_eq!(sender_account.balance, coins(100).to_signed());
    assert_eq!(sender_account.u_balance, coins(100).to_signed());
    assert_eq!(recipient_account.balance, coins(3).to_signed());
    assert_eq!(recipient_account.u_balance, coins(3).to_signed());

    // applying again after an undo lands on the same state
    context.engine.apply_unconfirmed(&transaction, false).unwrap();
    context.engine.apply(&transaction, tag(3)).unwrap();
    assert_eq!(
        context.ledger.get_account(&sender_address).unwrap().unwrap(),
        applied_sender
    );
}

#[test]
fn test_apply_without_funds_changes_nothing() {
    let context = context();
    let sender = keypair("broke sender");
    let sender_address = fund(&context, &sender, 10);
    let transaction = transfer(&context, &sender, &keypair("broke recipient"), coins(1));
    let before = context.ledger.get_account(&sender_address).unwrap().unwrap();

    assert_matches!(
        context.engine.apply_unconfirmed(&transaction, false),
        Err(TransactionError::InsufficientFunds { .. })
    );
    assert_matches!(
        context.engine.apply(&transaction, tag(2)),
        Err(TransactionError::InsufficientFunds { .. })
    );
    let after = context.ledger.get_account(&sender_address).unwrap().unwrap();
    assert_eq!(after.balance, before.balance);
    assert_eq!(after.u_balance, before.u_balance);
}

#[test]
fn test_genesis_apply_goes_negative() {
    let context = context();
    let source = keypair("genesis source");
    let source_address = address(&context, &source);
    let transaction = transfer(&context, &source, &keypair("genesis holder"), coins(1_000));
    let genesis = BlockTag {
        block_id: BlockId::new(1),
        round: 1,
        genesis: true,
    };

    context.engine.apply_unconfirmed(&transaction, true).unwrap();
    context.engine.apply(&transaction, genesis).unwrap();
    let account = context.ledger.get_account(&source_address).unwrap().unwrap();
    assert_eq!(account.balance, -transaction.total_cost().unwrap().to_signed());
}

#[test]
fn test_confirm_helper_debits_once() {
    let context = context();
    let sender = keypair("confirm sender");
    let sender_address = fund(&context, &sender, coins(20).to_signed());
    let transaction = transfer(&context, &sender, &keypair("confirm recipient"), coins(2));
    confirm(&context, &transaction, 4);
    let account = context.ledger.get_account(&sender_address).unwrap().unwrap();
    assert_eq!(account.balance, account.u_balance);
    assert_eq!(
        account.balance,
        coins(20).to_signed() - transaction.total_cost().unwrap().to_signed()
    );
}
