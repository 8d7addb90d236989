// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::TransactionConfig;
use crate::engine::TransactionRequest;
use crate::error::{TransactionError, TransactionResult};
use crate::types::{DelegateLogic, MultisignatureLogic, SecondSignatureLogic, TransferLogic, VoteLogic};
use dpos_ledger::LedgerController;
use dpos_models::{
    Account, AccountDelta, Address, Amount, BlockTag, FeeSchedule, Transaction, TransactionType,
};
use dpos_signature::PublicKey;
use tracing::error;

/// What a transaction logic may read while verifying or computing effects
pub struct LogicContext<'a> {
    /// engine configuration
    pub config: &'a TransactionConfig,
    /// ledger
    pub ledger: &'a dyn LedgerController,
}

impl<'a> LogicContext<'a> {
    /// Address of the sender of `transaction`
    pub fn sender_address(&self, transaction: &Transaction) -> Address {
        Address::from_public_key(&transaction.sender_public_key, self.config.address_version)
    }
}

/// Behaviour of one transaction type.
///
/// Effects are returned as ledger deltas, in merge order. Undo merges their negations in
/// reverse order, so apply and undo are symmetric by construction. The sender debit
/// (amount + fee) is not part of the effects: the engine handles it.
pub trait TransactionLogic: Send + Sync {
    /// Transaction type handled
    fn kind(&self) -> TransactionType;

    /// Unsigned transaction of this type, without fee
    fn create(
        &self,
        request: &TransactionRequest,
        sender_public_key: PublicKey,
    ) -> TransactionResult<Transaction>;

    /// Minimum fee
    fn calculate_fee(&self, transaction: &Transaction, fees: &FeeSchedule) -> Amount;

    /// Encoded asset
    fn asset_bytes(&self, transaction: &Transaction) -> Vec<u8> {
        transaction.asset.to_bytes()
    }

    /// Shape checks that do not need the ledger
    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()>;

    /// Type rules against the confirmed state of the sender
    fn verify(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()>;

    /// Type rules against the unconfirmed state of the sender
    fn verify_unconfirmed(
        &self,
        _context: &LogicContext,
        _transaction: &Transaction,
        _sender: &Account,
    ) -> TransactionResult<()> {
        Ok(())
    }

    /// Confirmed-tier effects
    fn confirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>>;

    /// Unconfirmed-tier effects
    fn unconfirmed_effects(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<Vec<(Address, AccountDelta)>>;

    /// Whether enough co-signatures are attached for the transaction to go in a block
    fn ready(&self, transaction: &Transaction, sender: &Account) -> bool {
        if sender.is_multisignature() {
            transaction.signatures.len() >= sender.multimin as usize
        } else {
            true
        }
    }

    /// Merge the confirmed effects, tagged with the enclosing block
    fn apply(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        tag: BlockTag,
    ) -> TransactionResult<()> {
        let effects = self.confirmed_effects(context, transaction)?;
        merge_all(context, effects, Some(tag))
    }

    /// Revert `apply`
    fn undo(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
        tag: BlockTag,
    ) -> TransactionResult<()> {
        let effects = self.confirmed_effects(context, transaction)?;
        merge_all(context, negate_all(effects), Some(tag))
    }

    /// Merge the unconfirmed effects
    fn apply_unconfirmed(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<()> {
        let effects = self.unconfirmed_effects(context, transaction)?;
        merge_all(context, effects, None)
    }

    /// Revert `apply_unconfirmed`
    fn undo_unconfirmed(
        &self,
        context: &LogicContext,
        transaction: &Transaction,
    ) -> TransactionResult<()> {
        let effects = self.unconfirmed_effects(context, transaction)?;
        merge_all(context, negate_all(effects), None)
    }
}

fn negate_all(effects: Vec<(Address, AccountDelta)>) -> Vec<(Address, AccountDelta)> {
    effects
        .into_iter()
        .rev()
        .map(|(address, delta)| (address, delta.negated()))
        .collect()
}

/// Merge `effects` in order. If one merge fails the previous ones are reverted.
fn merge_all(
    context: &LogicContext,
    effects: Vec<(Address, AccountDelta)>,
    tag: Option<BlockTag>,
) -> TransactionResult<()> {
    let mut merged: Vec<(Address, AccountDelta)> = Vec::with_capacity(effects.len());
    for (address, delta) in effects {
        let delta = delta.tagged(tag);
        if let Err(err) = context.ledger.merge(&address, &delta) {
            for (done_address, done_delta) in merged.iter().rev() {
                if let Err(revert_err) = context.ledger.merge(done_address, &done_delta.negated())
                {
                    error!(
                        "could not revert merge on {} after failure: {}",
                        done_address, revert_err
                    );
                }
            }
            return Err(TransactionError::from(err));
        }
        merged.push((address, delta));
    }
    Ok(())
}

static TRANSFER: TransferLogic = TransferLogic;
static SECOND_SIGNATURE: SecondSignatureLogic = SecondSignatureLogic;
static DELEGATE: DelegateLogic = DelegateLogic;
static VOTE: VoteLogic = VoteLogic;
static MULTISIGNATURE: MultisignatureLogic = MultisignatureLogic;

/// Logic of a transaction type
pub fn logic_for(kind: TransactionType) -> &'static dyn TransactionLogic {
    match kind {
        TransactionType::Transfer => &TRANSFER,
        TransactionType::SecondSignature => &SECOND_SIGNATURE,
        TransactionType::DelegateRegistration => &DELEGATE,
        TransactionType::Vote => &VOTE,
        TransactionType::Multisignature => &MULTISIGNATURE,
    }
}
