// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{check_no_transfer, policy, unsigned_transaction};
use crate::engine::TransactionRequest;
use crate::error::{TransactionError, TransactionResult};
use crate::logic::{LogicContext, TransactionLogic};
use dpos_models::{
    Account, AccountDelta, Address, Amount, FeeSchedule, FieldChange, SetAction, SetEntry,
    Transaction, TransactionAsset, TransactionType,
};
use dpos_signature::PublicKey;
use std::collections::HashSet;

/// Turns the sender into an m-of-n multisignature account
pub(crate) struct MultisignatureLogic;

struct Registration<'a> {
    min: u8,
    lifetime: u8,
    keysgroup: &'a [SetEntry],
}

fn registration_of(transaction: &Transaction) -> TransactionResult<Registration<'_>> {
    match &transaction.asset {
        TransactionAsset::Multisignature {
            min,
            lifetime,
            keysgroup,
        } => Ok(Registration {
            min: *min,
            lifetime: *lifetime,
            keysgroup,
        }),
        _ => Err(TransactionError::Malformed(
            "multisignature asset expected".into(),
        )),
    }
}

impl TransactionLogic for MultisignatureLogic {
    fn kind(&self) -> TransactionType {
        TransactionType::Multisignature
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

    fn calculate_fee(&self, transaction: &Transaction, fees: &FeeSchedule) -> Amount {
        let keys = registration_of(transaction)
            .map(|registration| registration.keysgroup.len() as u64)
            .unwrap_or(0);
        fees.multisignature
            .checked_mul_u64(keys + 1)
            .unwrap_or_else(|| Amount::from_raw(u64::MAX))
    }

    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()> {
        check_no_transfer(transaction)?;
        let registration = registration_of(transaction)?;
        if registration
            .keysgroup
            .iter()
            .any(|entry| entry.action != SetAction::Add)
        {
            return Err(TransactionError::Malformed(
                "keysgroup entries must be additions".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(registration.keysgroup.len());
        if !registration
            .keysgroup
            .iter()
            .all(|entry| seen.insert(entry.public_key))
        {
            return Err(TransactionError::Malformed(
                "duplicate key in keysgroup".into(),
            ));
        }
        if seen.contains(&transaction.sender_public_key) {
            return Err(TransactionError::Malformed(
                "keysgroup contains the sender key".into(),
            ));
        }
        Ok(())
    }

    fn verify(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if sender.is_multisignature() {
            return Err(policy("account is already a multisignature account"));
        }
        let registration = registration_of(transaction)?;
        let (min_keys, max_keys) = context.config.multisignature_keys;
        let keys = registration.keysgroup.len();
        if keys < min_keys || keys > max_keys {
            return Err(policy(format!(
                "keysgroup of {} keys, expected {} to {}",
                keys, min_keys, max_keys
            )));
        }
        if registration.min < 1 || registration.min as usize > keys {
            return Err(policy(format!(
                "minimum of {} signatures for {} keys",
                registration.min, keys
            )));
        }
        let (min_lifetime, max_lifetime) = context.config.multisignature_lifetime;
        if registration.lifetime < min_lifetime || registration.lifetime > max_lifetime {
            return Err(policy(format!(
                "lifetime of {} hours, expected {} to {}",
                registration.lifetime, min_lifetime, max_lifetime
            )));
        }
        Ok(())
    }

    fn verify_unconfirmed(
        &self,
        _context: &LogicContext,
        _transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if !sender.u_multisignatures.is_empty() {
            return Err(policy("multisignature registration already pending"));
        }
        Ok(())
    }

    fn ready(&self, transaction: &Transaction, _sender: &Account) -> bool {
        registration_of(transaction)
            .map(|registration| transaction.signatures.len() >= registration.min as usize)
            .unwrap_or(false)
    }

    fn confirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let registration = registration_of(transaction)?;
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                multisignatures: registration.keysgroup.to_vec(),
                multimin: FieldChange::set(0, registration.min),
                multilifetime: FieldChange::set(0, registration.lifetime),
                ..Default::default()
            },
        )])
    }

    fn unconfirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let registration = registration_of(transaction)?;
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                u_multisignatures: registration.keysgroup.to_vec(),
                u_multimin: FieldChange::set(0, registration.min),
                u_multilifetime: FieldChange::set(0, registration.lifetime),
                ..Default::default()
            },
        )])
    }
}
