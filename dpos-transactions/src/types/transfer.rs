// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::unsigned_transaction;
use crate::engine::TransactionRequest;
use crate::error::{TransactionError, TransactionResult};
use crate::logic::{LogicContext, TransactionLogic};
use dpos_models::{
    Account, AccountDelta, Address, Amount, FeeSchedule, Transaction, TransactionType,
};
use dpos_signature::PublicKey;

/// Coin transfer to a recipient address
pub(crate) struct TransferLogic;

impl TransactionLogic for TransferLogic {
    fn kind(&self) -> TransactionType {
        TransactionType::Transfer
    }

    fn create(
        &self,
        request: &TransactionRequest,
        sender_public_key: PublicKey,
    ) -> TransactionResult<Transaction> {
        let recipient = request
            .recipient
            .ok_or_else(|| TransactionError::InvalidRecipient("missing recipient".into()))?;
        Ok(unsigned_transaction(
            request,
            sender_public_key,
            Some(recipient),
            request.amount,
        ))
    }

    fn calculate_fee(&self, _transaction: &Transaction, fees: &FeeSchedule) -> Amount {
        fees.transfer
    }

    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()> {
        if transaction.recipient.is_none() {
            return Err(TransactionError::InvalidRecipient(
                "missing recipient".into(),
            ));
        }
        if transaction.amount.is_zero() {
            return Err(TransactionError::InvalidAmount(
                "transfer of a zero amount".into(),
            ));
        }
        Ok(())
    }

    fn verify(
        &self,
        _context: &LogicContext,
        _transaction: &Transaction,
        _sender: &Account,
    ) -> TransactionResult<()> {
        Ok(())
    }

    fn confirmed_effects(
        &self,
        _context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let recipient = transaction
            .recipient
            .ok_or_else(|| TransactionError::InvalidRecipient("missing recipient".into()))?;
        Ok(vec![(
            recipient,
            AccountDelta::balances(transaction.amount.to_signed()),
        )])
    }

    fn unconfirmed_effects(
        &self,
        _context: &LogicContext,
        _transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        Ok(Vec::new())
    }
}
