// Copyright (c) 2022 MASSA LABS <info@massa.net>

mod delegate;
mod multisignature;
mod second_signature;
mod transfer;
mod vote;

pub(crate) use delegate::DelegateLogic;
pub(crate) use multisignature::MultisignatureLogic;
pub(crate) use second_signature::SecondSignatureLogic;
pub(crate) use transfer::TransferLogic;
pub(crate) use vote::VoteLogic;

use crate::engine::TransactionRequest;
use crate::error::{TransactionError, TransactionResult};
use dpos_models::{Address, Amount, Transaction};
use dpos_signature::PublicKey;

/// Unsigned transaction built from a request
pub(crate) fn unsigned_transaction(
    request: &TransactionRequest,
    sender_public_key: PublicKey,
    recipient: Option<Address>,
    amount: Amount,
) -> Transaction {
    let mut transaction = Transaction::new(
        request.asset.clone(),
        sender_public_key,
        recipient,
        amount,
        Amount::zero(),
        request.timestamp,
    );
    transaction.vendor_field = request.vendor_field.clone();
    transaction
}

/// Types other than transfers move no coins and have no recipient
pub(crate) fn check_no_transfer(transaction: &Transaction) -> TransactionResult<()> {
    if transaction.recipient.is_some() {
        return Err(TransactionError::Malformed(format!(
            "{:?} transaction with a recipient",
            transaction.kind()
        )));
    }
    if !transaction.amount.is_zero() {
        return Err(TransactionError::InvalidAmount(format!(
            "{:?} transaction moving {}",
            transaction.kind(),
            transaction.amount
        )));
    }
    Ok(())
}

pub(crate) fn policy(message: impl Into<String>) -> TransactionError {
    TransactionError::PolicyViolation(message.into())
}
