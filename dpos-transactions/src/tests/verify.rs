// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{address, coins, context, fund, keypair, transfer};
use crate::{TransactionError, TransactionRequest};
use assert_matches::assert_matches;
use dpos_models::{Amount, Block, ErrorKind, TransactionAsset};
use dpos_storage::StorageController;

#[test]
fn test_valid_transfer_verifies() {
    let context = context();
    let sender = keypair("verify sender");
    let recipient = keypair("verify recipient");
    let sender_address = fund(&context, &sender, coins(100).to_signed());

    let transaction = transfer(&context, &sender, &recipient, coins(10));
    assert_eq!(
        transaction.fee,
        context.engine.config().fees.transfer,
        "created with the minimum fee"
    );
    let account = context.engine.verify(&transaction).unwrap();
    assert_eq!(account.address, sender_address);
}

#[test]
fn test_fee_checked_before_balance() {
    let context = context();
    let sender = keypair("low fee sender");
    let recipient = keypair("low fee recipient");
    // the sender can not afford the transfer either
    fund(&context, &sender, 1);

    let request = TransactionRequest::transfer(address(&context, &recipient), coins(5), 0);
    let mut transaction = context.engine.create(&request, &sender, None).unwrap();
    transaction.fee = Amount::from_raw(1);
    transaction.sign(&sender, None).unwrap();

    let err = context.engine.verify(&transaction).unwrap_err();
    assert_matches!(err, TransactionError::FeeTooLow { .. });
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
}

#[test]
fn test_unknown_sender() {
    let context = context();
    let transaction = transfer(&context, &keypair("ghost"), &keypair("anyone"), coins(1));
    assert_matches!(
        context.engine.verify(&transaction),
        Err(TransactionError::UnknownSender(_))
    );
}

#[test]
fn test_tampered_transaction_rejected() {
    let context = context();
    let sender = keypair("tamper sender");
    fund(&context, &sender, coins(100).to_signed());
    let mut transaction = transfer(&context, &sender, &keypair("tamper recipient"), coins(1));

    transaction.amount = coins(50);
    assert_matches!(
        context.engine.verify(&transaction),
        Err(TransactionError::InvalidId { .. })
    );

    transaction.id = transaction.compute_id();
    let err = context.engine.verify(&transaction).unwrap_err();
    assert_matches!(err, TransactionError::InvalidSignature(_));
    assert!(err.kind().bans_peer());
}

#[test]
fn test_process_rejects_long_vendor_field() {
    let context = context();
    let sender = keypair("vendor sender");
    let mut transaction = transfer(&context, &sender, &keypair("vendor recipient"), coins(1));
    transaction.vendor_field = Some("x".repeat(65));
    transaction.sign(&sender, None).unwrap();
    assert_matches!(
        context.engine.process(transaction),
        Err(TransactionError::Malformed(_))
    );
}

#[test]
fn test_future_timestamp_rejected() {
    let context = context();
    let sender = keypair("future sender");
    fund(&context, &sender, coins(100).to_signed());
    let request = TransactionRequest::transfer(
        address(&context, &keypair("future recipient")),
        coins(1),
        u32::MAX,
    );
    let transaction = context.engine.create(&request, &sender, None).unwrap();
    assert_matches!(
        context.engine.verify(&transaction),
        Err(TransactionError::FutureTimestamp { .. })
    );
}

#[test]
fn test_insufficient_funds() {
    let context = context();
    let sender = keypair("poor sender");
    fund(&context, &sender, coins(1).to_signed());
    let transaction = transfer(&context, &sender, &keypair("poor recipient"), coins(1));
    let err = context.engine.verify(&transaction).unwrap_err();
    assert_matches!(err, TransactionError::InsufficientFunds { .. });
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
}

#[test]
fn test_exception_skips_balance_check_only() {
    let mut context = context();
    let sender = keypair("exempt sender");
    fund(&context, &sender, coins(1).to_signed());
    let transaction = transfer(&context, &sender, &keypair("exempt recipient"), coins(1));

    let mut config = context.engine.config().clone();
    config.exceptions.balances.insert(transaction.id);
    context.engine = crate::TransactionEngine::new(
        config,
        Box::new(context.ledger.clone()),
        Box::new(context.storage.clone()),
    );
    assert!(context.engine.verify(&transaction).is_ok());
}

#[test]
fn test_second_signature_required_once_registered() {
    let context = context();
    let sender = keypair("second sender");
    let second = keypair("second key");
    fund(&context, &sender, coins(100).to_signed());

    let registration = context
        .engine
        .create(
            &TransactionRequest::new(
                TransactionAsset::SecondSignature {
                    public_key: second.get_public_key(),
                },
                0,
            ),
            &sender,
            None,
        )
        .unwrap();
    super::tools::confirm(&context, &registration, 2);

    let unsigned = transfer(&context, &sender, &keypair("second recipient"), coins(1));
    assert_matches!(
        context.engine.verify(&unsigned),
        Err(TransactionError::InvalidSignature(_))
    );

    let request = TransactionRequest::transfer(
        address(&context, &keypair("second recipient")),
        coins(1),
        0,
    );
    let signed = context
        .engine
        .create(&request, &sender, Some(&second))
        .unwrap();
    assert!(context.engine.verify(&signed).is_ok());
}

#[test]
fn test_confirmed_transaction_conflicts() {
    let context = context();
    let sender = keypair("confirmed sender");
    fund(&context, &sender, coins(100).to_signed());
    let transaction = transfer(&context, &sender, &keypair("confirmed recipient"), coins(1));

    let block = Block::new_signed(
        &sender,
        0,
        0,
        None,
        vec![transaction.clone()],
        Amount::zero(),
    )
    .unwrap();
    context.storage.save_block(&block).unwrap();

    let err = context.engine.verify(&transaction).unwrap_err();
    assert_matches!(err, TransactionError::AlreadyConfirmed(_));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}
