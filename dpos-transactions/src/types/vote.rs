// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{check_no_transfer, policy, unsigned_transaction};
use crate::engine::TransactionRequest;
use crate::error::{TransactionError, TransactionResult};
use crate::logic::{LogicContext, TransactionLogic};
use dpos_models::{
    Account, AccountDelta, Address, Amount, FeeSchedule, SetAction, SetEntry, Transaction,
    TransactionAsset, TransactionType,
};
use dpos_signature::PublicKey;
use std::collections::HashSet;

/// Adds and removes votes of the sender
pub(crate) struct VoteLogic;

fn votes_of(transaction: &Transaction) -> TransactionResult<&[SetEntry]> {
    match &transaction.asset {
        TransactionAsset::Vote { votes } => Ok(votes),
        _ => Err(TransactionError::Malformed("vote asset expected".into())),
    }
}

impl VoteLogic {
    /// Checks the tokens against the current votes of the sender and the delegate flags
    fn check_votes(
        &self,
        context: &LogicContext,
        votes: &[SetEntry],
        current: &[PublicKey],
        unconfirmed: bool,
    ) -> TransactionResult<()> {
        let mut count = current.len();
        for vote in votes {
            let target = context.ledger.get_account_by_public_key(&vote.public_key)?;
            let is_delegate = target
                .map(|account| {
                    if unconfirmed {
                        account.u_is_delegate
                    } else {
                        account.is_delegate
                    }
                })
                .unwrap_or(false);
            if !is_delegate {
                return Err(policy(format!("{} is not a delegate", vote.public_key)));
            }
            let voted = current.contains(&vote.public_key);
            match vote.action {
                SetAction::Add if voted => {
                    return Err(policy(format!("already voted for {}", vote.public_key)))
                }
                SetAction::Remove if !voted => {
                    return Err(policy(format!("no vote for {} to remove", vote.public_key)))
                }
                SetAction::Add => count += 1,
                SetAction::Remove => count = count.saturating_sub(1),
            }
        }
        if count > context.config.max_votes_per_account {
            return Err(policy(format!(
                "{} votes exceed the maximum of {}",
                count, context.config.max_votes_per_account
            )));
        }
        Ok(())
    }
}

impl TransactionLogic for VoteLogic {
    fn kind(&self) -> TransactionType {
        TransactionType::Vote
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
        fees.vote
    }

    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()> {
        check_no_transfer(transaction)?;
        let votes = votes_of(transaction)?;
        let mut seen = HashSet::with_capacity(votes.len());
        if !votes
            .iter()
            .all(|vote| seen.insert(vote.public_key))
        {
            return Err(TransactionError::Malformed(
                "several votes for the same delegate".into(),
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
        let votes = votes_of(transaction)?;
        if votes.is_empty() || votes.len() > context.config.max_votes_per_transaction {
            return Err(policy(format!(
                "a vote carries 1 to {} tokens, got {}",
                context.config.max_votes_per_transaction,
                votes.len()
            )));
        }
        self.check_votes(context, votes, &sender.delegates, false)
    }

    fn verify_unconfirmed(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        self.check_votes(context, votes_of(transaction)?, &sender.u_delegates, true)
    }

    fn confirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                delegates: votes_of(transaction)?.to_vec(),
                ..Default::default()
            },
        )])
    }

    fn unconfirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>> {
        Ok(vec![(
            context.sender_address(transaction),
            AccountDelta {
                u_delegates: votes_of(transaction)?.to_vec(),
                ..Default::default()
            },
        )])
    }
}
