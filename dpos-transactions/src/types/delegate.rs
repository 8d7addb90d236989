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
use std::str::FromStr;

/// Registers the sender as a delegate under a unique name
pub(crate) struct DelegateLogic;

const USERNAME_SYMBOLS: &str = "!@$&_.";

fn username_of(transaction: &Transaction) -> TransactionResult<&str> {
    match &transaction.asset {
        TransactionAsset::DelegateRegistration { username } => Ok(username),
        _ => Err(TransactionError::Malformed(
            "delegate registration asset expected".into(),
        )),
    }
}

/// 1 to `max_length` characters among lowercase letters, digits and `!@$&_.`,
/// and not an address
fn check_username(username: &str, max_length: usize) -> TransactionResult<()> {
    if username.is_empty() || username.len() > max_length {
        return Err(policy(format!(
            "username must have 1 to {} characters",
            max_length
        )));
    }
    if !username.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || USERNAME_SYMBOLS.contains(c)
    }) {
        return Err(policy(format!(
            "username {} contains forbidden characters",
            username
        )));
    }
    if Address::from_str(username).is_ok() {
        return Err(policy("username can not be an address"));
    }
    Ok(())
}

impl TransactionLogic for DelegateLogic {
    fn kind(&self) -> TransactionType {
        TransactionType::DelegateRegistration
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
        fees.delegate
    }

    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()> {
        check_no_transfer(transaction)?;
        username_of(transaction).map(|_| ())
    }

    fn verify(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if sender.is_delegate {
            return Err(policy("account is already a delegate"));
        }
        let username = username_of(transaction)?;
        check_username(username, context.config.max_username_length)?;
        if let Some(owner) = context.ledger.get_account_by_username(username)? {
            if owner.username.as_deref() == Some(username) {
                return Err(policy(format!("username {} already taken", username)));
            }
        }
        Ok(())
    }

    fn verify_unconfirmed(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if sender.u_is_delegate {
            return Err(policy("account is already registering as a delegate"));
        }
        let username = username_of(transaction)?;
        if context.ledger.get_account_by_username(username)?.is_some() {
            return Err(policy(format!("username {} already taken", username)));
        }
        Ok(())
    }

    fn confirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let username = username_of(transaction)?.to_string();
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                is_delegate: FieldChange::set(false, true),
                username: FieldChange::set(None, Some(username)),
                ..Default::default()
            },
        )])
    }

    fn unconfirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        let username = username_of(transaction)?.to_string();
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                u_is_delegate: FieldChange::set(false, true),
                u_username: FieldChange::set(None, Some(username)),
                ..Default::default()
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::check_username;

    #[test]
    fn test_username_rules() {
        assert!(check_username("genesis_1", 20).is_ok());
        assert!(check_username("a.b!c@d$e&f", 20).is_ok());
        assert!(check_username("", 20).is_err());
        assert!(check_username("UPPER", 20).is_err());
        assert!(check_username("with space", 20).is_err());
        assert!(check_username("abcdefghijklmnopqrstu", 20).is_err());
    }
}
