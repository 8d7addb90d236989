// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{address, coins, confirm, context, fund, keypair, TestContext};
use crate::{TransactionError, TransactionRequest};
use assert_matches::assert_matches;
use dpos_ledger::LedgerController;
use dpos_models::{ErrorKind, SetEntry, Transaction, TransactionAsset};
use dpos_signature::KeyPair;

fn register_delegate(context: &TestContext, keypair: &KeyPair, username: &str) -> Transaction {
    context
        .engine
        .create(
            &TransactionRequest::new(
                TransactionAsset::DelegateRegistration {
                    username: username.to_string(),
                },
                0,
            ),
            keypair,
            None,
        )
        .unwrap()
}

fn vote(context: &TestContext, keypair: &KeyPair, votes: Vec<SetEntry>) -> Transaction {
    context
        .engine
        .create(
            &TransactionRequest::new(TransactionAsset::Vote { votes }, 0),
            keypair,
            None,
        )
        .unwrap()
}

fn register_multisignature(
    context: &TestContext,
    keypair: &KeyPair,
    min: u8,
    members: &[&KeyPair],
) -> Transaction {
    context
        .engine
        .create(
            &TransactionRequest::new(
                TransactionAsset::Multisignature {
                    min,
                    lifetime: 24,
                    keysgroup: members
                        .iter()
                        .map(|member| SetEntry::add(member.get_public_key()))
                        .collect(),
                },
                0,
            ),
            keypair,
            None,
        )
        .unwrap()
}

#[test]
fn test_delegate_registration() {
    let context = context();
    let first = keypair("delegate one");
    let second = keypair("delegate two");
    let first_address = fund(&context, &first, coins(100).to_signed());
    fund(&context, &second, coins(100).to_signed());

    let registration = register_delegate(&context, &first, "alice");
    assert_eq!(registration.fee, context.engine.config().fees.delegate);
    context.engine.verify(&registration).unwrap();
    context
        .engine
        .apply_unconfirmed(&registration, false)
        .unwrap();

    // the name is taken on the unconfirmed tier already
    let duplicate = register_delegate(&context, &second, "alice");
    assert_matches!(
        context.engine.apply_unconfirmed(&duplicate, false),
        Err(TransactionError::PolicyViolation(_))
    );

    context.engine.apply(&registration, super::tools::tag(2)).unwrap();
    let account = context.ledger.get_account(&first_address).unwrap().unwrap();
    assert!(account.is_delegate);
    assert_eq!(account.username.as_deref(), Some("alice"));
    assert_matches!(
        context.engine.verify(&duplicate),
        Err(TransactionError::PolicyViolation(_))
    );
    let again = register_delegate(&context, &first, "another");
    assert_matches!(
        context.engine.verify(&again),
        Err(TransactionError::PolicyViolation(_))
    );
}

#[test]
fn test_delegate_username_charset() {
    let context = context();
    let sender = keypair("bad name");
    fund(&context, &sender, coins(100).to_signed());
    let registration = register_delegate(&context, &sender, "Not Allowed");
    let err = context.engine.verify(&registration).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
}

#[test]
fn test_vote_rules() {
    let context = context();
    let delegate = keypair("voted delegate");
    let voter = keypair("voter");
    let voter_address = fund(&context, &voter, coins(100).to_signed());
    fund(&context, &delegate, coins(100).to_signed());
    let outsider = keypair("not a delegate").get_public_key();

    let to_outsider = vote(&context, &voter, vec![SetEntry::add(outsider)]);
    assert_matches!(
        context.engine.verify(&to_outsider),
        Err(TransactionError::PolicyViolation(_))
    );

    confirm(&context, &register_delegate(&context, &delegate, "bob"), 2);
    let upvote = vote(
        &context,
        &voter,
        vec![SetEntry::add(delegate.get_public_key())],
    );
    context.engine.verify(&upvote).unwrap();
    confirm(&context, &upvote, 3);
    let account = context.ledger.get_account(&voter_address).unwrap().unwrap();
    assert_eq!(account.delegates, vec![delegate.get_public_key()]);
    assert_eq!(account.u_delegates, vec![delegate.get_public_key()]);

    let twice = vote(
        &context,
        &voter,
        vec![SetEntry::add(delegate.get_public_key())],
    );
    assert_matches!(
        context.engine.verify(&twice),
        Err(TransactionError::PolicyViolation(_))
    );

    let unvote_unknown = vote(&context, &voter, vec![SetEntry::remove(outsider)]);
    assert!(context.engine.verify(&unvote_unknown).is_err());

    let downvote = vote(
        &context,
        &voter,
        vec![SetEntry::remove(delegate.get_public_key())],
    );
    context.engine.verify(&downvote).unwrap();
}

#[test]
fn test_vote_with_duplicate_tokens_is_malformed() {
    let context = context();
    let voter = keypair("double voter");
    let delegate = keypair("double target").get_public_key();
    let mut transaction = vote(&context, &voter, vec![SetEntry::add(delegate)]);
    transaction.asset = TransactionAsset::Vote {
        votes: vec![SetEntry::add(delegate), SetEntry::remove(delegate)],
    };
    transaction.sign(&voter, None).unwrap();
    let err = context.engine.process(transaction).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn test_multisignature_readiness() {
    let context = context();
    let owner = keypair("multisig owner");
    let members: Vec<KeyPair> = (0..5)
        .map(|index| keypair(&format!("member {}", index)))
        .collect();
    let owner_address = fund(&context, &owner, coins(1_000).to_signed());
    let member_refs: Vec<&KeyPair> = members.iter().collect();

    let mut registration = register_multisignature(&context, &owner, 3, &member_refs);
    assert_eq!(
        registration.fee,
        context
            .engine
            .config()
            .fees
            .multisignature
            .checked_mul_u64(6)
            .unwrap()
    );

    for member in &members[..2] {
        registration
            .signatures
            .push(registration.cosign(member).unwrap());
        assert!(!context.engine.ready(&registration).unwrap());
    }
    context.engine.verify(&registration).unwrap();

    registration
        .signatures
        .push(registration.cosign(&members[2]).unwrap());
    assert!(context.engine.ready(&registration).unwrap());
    context.engine.verify(&registration).unwrap();

    let mut forged = registration.clone();
    forged
        .signatures
        .push(forged.cosign(&keypair("intruder")).unwrap());
    assert_matches!(
        context.engine.verify(&forged),
        Err(TransactionError::InvalidCosignatures(_))
    );

    confirm(&context, &registration, 2);
    let account = context.ledger.get_account(&owner_address).unwrap().unwrap();
    assert_eq!(account.multimin, 3);
    assert_eq!(account.multilifetime, 24);
    assert_eq!(account.multisignatures.len(), 5);

    // a transfer of the multisignature account waits for three co-signatures
    let mut spend = super::tools::transfer(&context, &owner, &keypair("payee"), coins(1));
    for member in [&members[4], &members[0]] {
        spend.signatures.push(spend.cosign(member).unwrap());
    }
    assert!(!context.engine.ready(&spend).unwrap());
    spend.signatures.push(spend.cosign(&members[3]).unwrap());
    assert!(context.engine.ready(&spend).unwrap());
    context.engine.verify(&spend).unwrap();
}

#[test]
fn test_requester_signs_for_multisignature_account() {
    let context = context();
    let owner = keypair("requested owner");
    let member = keypair("requesting member");
    fund(&context, &owner, coins(1_000).to_signed());
    let registration = register_multisignature(&context, &owner, 1, &[&member]);
    confirm(&context, &registration, 2);

    let mut request = TransactionRequest::transfer(
        address(&context, &keypair("requested payee")),
        coins(1),
        0,
    );
    request.on_behalf_of = Some(owner.get_public_key());
    let transaction = context.engine.create(&request, &member, None).unwrap();
    assert_eq!(transaction.sender_public_key, owner.get_public_key());
    assert_eq!(
        transaction.requester_public_key,
        Some(member.get_public_key())
    );
    context.engine.verify(&transaction).unwrap();

    let stranger = keypair("stranger");
    let mut request = request.clone();
    request.on_behalf_of = Some(owner.get_public_key());
    let rejected = context.engine.create(&request, &stranger, None).unwrap();
    assert_matches!(
        context.engine.verify(&rejected),
        Err(TransactionError::InvalidRequester(_))
    );
}

#[test]
fn test_multisignature_bounds() {
    let context = context();
    let owner = keypair("bounded owner");
    let member = keypair("bounded member");
    fund(&context, &owner, coins(1_000).to_signed());

    let too_demanding = register_multisignature(&context, &owner, 2, &[&member]);
    assert_matches!(
        context.engine.verify(&too_demanding),
        Err(TransactionError::PolicyViolation(_))
    );

    let mut with_self = register_multisignature(&context, &owner, 1, &[&member]);
    with_self.asset = TransactionAsset::Multisignature {
        min: 1,
        lifetime: 24,
        keysgroup: vec![SetEntry::add(owner.get_public_key())],
    };
    with_self.sign(&owner, None).unwrap();
    assert_eq!(
        context.engine.process(with_self).unwrap_err().kind(),
        ErrorKind::Malformed
    );
}
