// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{check_no_transfer, policy, unsigned_transaction};
use crate::engine::TransactionRequest;
use crate::error::{TransactionError, TransactionResult};
use crate::logic::{LogicContext, TransactionLogic};
use dpos_models::{
    Account, AccountDelta, Address, Amount, FeeSchedule, FieldChange, Transaction,
    TransactionAsset, TransactionType,
};
use dpos_signature::PublicKey;

/// Registers a second key: once confirmed, every transaction of the sender needs its signature
pub(crate) struct SecondSignatureLogic;

fn second_key(transaction: &Transaction) -> TransactionResult<PublicKey> {
    match &transaction.asset {
        TransactionAsset::SecondSignature { public_key } => Ok(*public_key),
        _ => Err(TransactionError::Malformed(
            "second signature asset expected".into(),
        )),
    }
}

impl TransactionLogic for SecondSignatureLogic {
    fn kind(&self) -> TransactionType {
        TransactionType::SecondSignature
    }

    fn create(
        &self,
        request: &TransactionRequest,
        sender_public_key: PublicKey,
    ) -> TransactionResult<Transaction> {
        Ok(unsigned_transaction(
            request,
            sender_public_key,
            None,
            Amount::zero(),
        ))
    }

    fn calculate_fee(&self, _transaction: &Transaction, fees: &FeeSchedule) -> Amount {
        fees.second_signature
    }

    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()> {
        check_no_transfer(transaction)?;
        second_key(transaction).map(|_| ())
    }

    fn verify(
        &self,
        _context: &LogicContext,
        _transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if sender.second_signature {
            return Err(policy("second signature already enabled"));
        }
        Ok(())
    }

    fn verify_unconfirmed(
        &self,
        _context: &LogicContext,
        _transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if sender.u_second_signature {
            return Err(policy("second signature already pending"));
        }
        Ok(())
    }

    fn confirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let key = second_key(transaction)?;
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                second_signature: FieldChange::set(false, true),
                second_public_key: FieldChange::set(None, Some(key)),
                ..Default::default()
            },
        )])
    }

    fn unconfirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let key = second_key(transaction)?;
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                u_second_signature: FieldChange::set(false, true),
                u_second_public_key: FieldChange::set(None, Some(key)),
                ..Default::default()
            },
        )])
    }
}
