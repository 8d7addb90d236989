// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::TransactionConfig;
use crate::error::{TransactionError, TransactionResult};
use crate::logic::{logic_for, LogicContext, TransactionLogic};
use dpos_hash::Hash;
use dpos_ledger::LedgerController;
use dpos_logging::dpos_trace;
use dpos_models::config::constants::MAX_VENDOR_FIELD_LENGTH;
use dpos_models::{
    Account, AccountDelta, Address, Amount, BlockTag, Transaction, TransactionAsset,
    TransactionType,
};
use dpos_signature::{KeyPair, PublicKey, Signature};
use dpos_storage::StorageController;
use std::collections::HashSet;
use tracing::{debug, error};

/// What the creator of a transaction asks for
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// type-specific payload
    pub asset: TransactionAsset,
    /// transfer recipient
    pub recipient: Option<Address>,
    /// transferred amount
    pub amount: Amount,
    /// free text
    pub vendor_field: Option<String>,
    /// seconds since the chain epoch
    pub timestamp: u32,
    /// multisignature account the signer acts for
    pub on_behalf_of: Option<PublicKey>,
}

impl TransactionRequest {
    /// Request with no recipient, amount or vendor field
    pub fn new(asset: TransactionAsset, timestamp: u32) -> Self {
        TransactionRequest {
            asset,
            recipient: None,
            amount: Amount::zero(),
            vendor_field: None,
            timestamp,
            on_behalf_of: None,
        }
    }

    /// Transfer of `amount` to `recipient`
    pub fn transfer(recipient: Address, amount: Amount, timestamp: u32) -> Self {
        TransactionRequest {
            recipient: Some(recipient),
            amount,
            ..TransactionRequest::new(TransactionAsset::Transfer, timestamp)
        }
    }
}

/// Creates, verifies and applies transactions against the ledger.
///
/// The engine takes the sender debit (amount + fee) on the tier being applied and delegates
/// the type effects to the `TransactionLogic` of the transaction type.
#[derive(Clone)]
pub struct TransactionEngine {
    config: TransactionConfig,
    ledger: Box<dyn LedgerController>,
    storage: Box<dyn StorageController>,
}

fn signature_error(err: impl std::fmt::Display) -> TransactionError {
    TransactionError::InvalidSignature(err.to_string())
}

fn check_signature(
    public_key: &PublicKey,
    hash: &Hash,
    signature: Option<&Signature>,
    what: &str,
) -> TransactionResult<()> {
    let signature = signature.ok_or_else(|| signature_error(format!("missing {}", what)))?;
    public_key
        .verify_signature(hash, signature)
        .map_err(|err| signature_error(format!("{}: {}", what, err)))
}

impl TransactionEngine {
    /// Engine over `ledger`, with `storage` used to detect confirmed transactions
    pub fn new(
        config: TransactionConfig,
        ledger: Box<dyn LedgerController>,
        storage: Box<dyn StorageController>,
    ) -> Self {
        TransactionEngine {
            config,
            ledger,
            storage,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Logic of a transaction type
    pub fn logic(&self, kind: TransactionType) -> &'static dyn TransactionLogic {
        logic_for(kind)
    }

    /// Context handed to the type logics
    pub fn context(&self) -> LogicContext<'_> {
        LogicContext {
            config: &self.config,
            ledger: self.ledger.as_ref(),
        }
    }

    /// Address of the sender of `transaction`
    pub fn sender_address(&self, transaction: &Transaction) -> Address {
        Address::from_public_key(&transaction.sender_public_key, self.config.address_version)
    }

    /// Builds and signs a transaction with the minimum fee.
    ///
    /// With `on_behalf_of`, the transaction is sent by that account and `keypair` signs as
    /// the requester, which must be a member of its keysgroup.
    pub fn create(
        &self,
        request: &TransactionRequest,
        keypair: &KeyPair,
        second_keypair: Option<&KeyPair>,
    ) -> TransactionResult<Transaction> {
        let signer = keypair.get_public_key();
        let logic = self.logic(request.asset.kind());
        let mut transaction = logic.create(request, request.on_behalf_of.unwrap_or(signer))?;
        if request.on_behalf_of.is_some() {
            transaction.requester_public_key = Some(signer);
        }
        transaction.fee = logic.calculate_fee(&transaction, &self.config.fees);
        self.normalize(&transaction)?;
        transaction.sign(keypair, second_keypair)?;
        Ok(transaction)
    }

    /// Minimum fee of `transaction`
    pub fn calculate_fee(&self, transaction: &Transaction) -> Amount {
        self.logic(transaction.kind())
            .calculate_fee(transaction, &self.config.fees)
    }

    fn check_id(&self, transaction: &Transaction) -> TransactionResult<()> {
        let computed = transaction.compute_id();
        if computed != transaction.id {
            return Err(TransactionError::InvalidId {
                declared: transaction.id.to_string(),
                computed: computed.to_string(),
            });
        }
        Ok(())
    }

    fn normalize(&self, transaction: &Transaction) -> TransactionResult<()> {
        if let Some(vendor_field) = &transaction.vendor_field {
            if vendor_field.len() > MAX_VENDOR_FIELD_LENGTH {
                return Err(TransactionError::Malformed(format!(
                    "vendor field of {} bytes, at most {}",
                    vendor_field.len(),
                    MAX_VENDOR_FIELD_LENGTH
                )));
            }
        }
        self.logic(transaction.kind()).normalize(transaction)
    }

    /// Ledger-free checks of a received transaction: id and shape
    pub fn process(&self, transaction: Transaction) -> TransactionResult<Transaction> {
        self.check_id(&transaction)?;
        self.normalize(&transaction)?;
        Ok(transaction)
    }

    /// Keys allowed to co-sign `transaction`: the registered keysgroup for a
    /// multisignature registration, the keysgroup of the sender otherwise
    pub fn cosigners(&self, transaction: &Transaction, sender: &Account) -> Vec<PublicKey> {
        match &transaction.asset {
            TransactionAsset::Multisignature { keysgroup, .. } => {
                keysgroup.iter().map(|entry| entry.public_key).collect()
            }
            _ => sender.multisignatures.clone(),
        }
    }

    /// Each co-signature must be unique and match a distinct key of the cosigners
    pub fn verify_cosignatures(
        &self,
        transaction: &Transaction,
        sender: &Account,
    ) -> TransactionResult<()> {
        if transaction.signatures.is_empty()
            || self.config.exceptions.skips_signature(&transaction.id)
        {
            return Ok(());
        }
        let cosigners = self.cosigners(transaction, sender);
        let hash = transaction.signing_hash();
        let mut seen_signatures = HashSet::with_capacity(transaction.signatures.len());
        let mut used_keys = HashSet::with_capacity(transaction.signatures.len());
        for signature in &transaction.signatures {
            if !seen_signatures.insert(signature) {
                return Err(TransactionError::InvalidCosignatures(
                    "duplicate co-signature".into(),
                ));
            }
            let signer = cosigners.iter().find(|key| {
                !used_keys.contains(*key) && key.verify_signature(&hash, signature).is_ok()
            });
            match signer {
                Some(key) => {
                    used_keys.insert(*key);
                }
                None => {
                    return Err(TransactionError::InvalidCosignatures(
                        "co-signature from no member of the keysgroup".into(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn check_signatures(&self, transaction: &Transaction, sender: &Account) -> TransactionResult<()> {
        if sender.second_signature {
            let second_key = sender.second_public_key.ok_or_else(|| {
                TransactionError::ModelsError(dpos_models::ModelsError::CheckedOperationError(
                    format!("account {} flags a second signature without key", sender.address),
                ))
            })?;
            check_signature(
                &second_key,
                &transaction.second_signing_hash(),
                transaction.second_signature.as_ref(),
                "second signature",
            )?;
        } else if transaction.second_signature.is_some() {
            return Err(signature_error("unexpected second signature"));
        }

        if let Some(registered) = sender.public_key {
            if registered != transaction.sender_public_key {
                return Err(TransactionError::SenderKeyMismatch(
                    transaction.sender_public_key.to_string(),
                ));
            }
        }

        let signer = match transaction.requester_public_key {
            Some(requester) => {
                if !sender.multisignatures.contains(&requester) {
                    return Err(TransactionError::InvalidRequester(format!(
                        "{} is not a member of the keysgroup of {}",
                        requester, sender.address
                    )));
                }
                requester
            }
            None => transaction.sender_public_key,
        };
        check_signature(
            &signer,
            &transaction.signing_hash(),
            transaction.signature.as_ref(),
            "signature",
        )
    }

    /// Full verification against the confirmed state. Returns the sender account.
    ///
    /// Checks run in a fixed order so that the first failing rule decides the error:
    /// id, sender, signatures, recipient, co-signatures, amount, fee, timestamp, balance,
    /// type rules, then confirmation status.
    pub fn verify(&self, transaction: &Transaction) -> TransactionResult<Account> {
        self.check_id(transaction)?;
        let address = self.sender_address(transaction);
        let sender = self
            .ledger
            .get_account(&address)?
            .ok_or_else(|| TransactionError::UnknownSender(address.to_string()))?;

        if self.config.exceptions.skips_signature(&transaction.id) {
            debug!("signature checks skipped for transaction {}", transaction.id);
        } else {
            self.check_signatures(transaction, &sender)?;
        }

        if let Some(recipient) = &transaction.recipient {
            if recipient.version() != self.config.address_version {
                return Err(TransactionError::InvalidRecipient(format!(
                    "{} has version {}, expected {}",
                    recipient,
                    recipient.version(),
                    self.config.address_version
                )));
            }
        }

        self.verify_cosignatures(transaction, &sender)?;

        if transaction.amount > self.config.total_supply {
            return Err(TransactionError::InvalidAmount(format!(
                "{} exceeds the total supply",
                transaction.amount
            )));
        }
        let cost = transaction.total_cost().ok_or_else(|| {
            TransactionError::InvalidAmount("amount plus fee overflows".into())
        })?;

        let minimum = self.calculate_fee(transaction);
        if transaction.fee < minimum {
            return Err(TransactionError::FeeTooLow {
                minimum: minimum.to_string(),
                actual: transaction.fee.to_string(),
            });
        }

        let slot = self.config.slot_clock.slot_number(transaction.timestamp);
        let current = self.config.slot_clock.current_slot()?;
        if slot > current {
            return Err(TransactionError::FutureTimestamp { slot, current });
        }

        if !self.config.exceptions.skips_balance(&transaction.id) && !sender.can_spend(cost) {
            return Err(TransactionError::InsufficientFunds {
                address: address.to_string(),
                balance: sender.balance,
                required: cost.to_raw(),
            });
        }

        self.logic(transaction.kind())
            .verify(&self.context(), transaction, &sender)?;

        if self.storage.transaction_exists(&transaction.id)? {
            return Err(TransactionError::AlreadyConfirmed(
                transaction.id.to_string(),
            ));
        }
        Ok(sender)
    }

    fn cost_of(&self, transaction: &Transaction) -> TransactionResult<i64> {
        transaction
            .total_cost()
            .map(|cost| cost.to_signed())
            .ok_or_else(|| TransactionError::InvalidAmount("amount plus fee overflows".into()))
    }

    fn revert_debit(&self, address: &Address, delta: &AccountDelta) {
        if let Err(err) = self.ledger.merge(address, &delta.negated()) {
            error!("could not revert debit of {}: {}", address, err);
        }
    }

    /// Applies `transaction` to the confirmed tier, inside the block `tag`
    pub fn apply(&self, transaction: &Transaction, tag: BlockTag) -> TransactionResult<()> {
        let address = self.sender_address(transaction);
        let sender = self
            .ledger
            .set_public_key(&address, &transaction.sender_public_key)?;
        let cost = self.cost_of(transaction)?;
        if !tag.genesis
            && !self.config.exceptions.skips_balance(&transaction.id)
            && sender.balance < cost
        {
            return Err(TransactionError::InsufficientFunds {
                address: address.to_string(),
                balance: sender.balance,
                required: cost as u64,
            });
        }
        let debit = AccountDelta {
            balance: -cost,
            ..Default::default()
        }
        .tagged(Some(tag));
        self.ledger.merge(&address, &debit)?;
        if let Err(err) = self
            .logic(transaction.kind())
            .apply(&self.context(), transaction, tag)
        {
            self.revert_debit(&address, &debit);
            return Err(err);
        }
        dpos_trace!("transactions.apply", {
            "transaction_id": transaction.id.to_string(),
            "block_id": tag.block_id.to_string()
        });
        Ok(())
    }

    /// Reverts `apply`
    pub fn undo(&self, transaction: &Transaction, tag: BlockTag) -> TransactionResult<()> {
        let address = self.sender_address(transaction);
        let cost = self.cost_of(transaction)?;
        self.logic(transaction.kind())
            .undo(&self.context(), transaction, tag)?;
        let refund = AccountDelta {
            balance: cost,
            ..Default::default()
        }
        .tagged(Some(tag));
        self.ledger.merge(&address, &refund)?;
        dpos_trace!("transactions.undo", {
            "transaction_id": transaction.id.to_string(),
            "block_id": tag.block_id.to_string()
        });
        Ok(())
    }

    /// Applies `transaction` to the unconfirmed tier.
    ///
    /// Genesis transactions skip the balance and type checks.
    pub fn apply_unconfirmed(&self, transaction: &Transaction, genesis: bool) -> TransactionResult<()> {
        let address = self.sender_address(transaction);
        let sender = self
            .ledger
            .set_public_key(&address, &transaction.sender_public_key)?;
        let cost = self.cost_of(transaction)?;
        let logic = self.logic(transaction.kind());
        if !genesis {
            if !self.config.exceptions.skips_balance(&transaction.id) && sender.u_balance < cost {
                return Err(TransactionError::InsufficientFunds {
                    address: address.to_string(),
                    balance: sender.u_balance,
                    required: cost as u64,
                });
            }
            logic.verify_unconfirmed(&self.context(), transaction, &sender)?;
        }
        let debit = AccountDelta {
            u_balance: -cost,
            ..Default::default()
        };
        self.ledger.merge(&address, &debit)?;
        if let Err(err) = logic.apply_unconfirmed(&self.context(), transaction) {
            self.revert_debit(&address, &debit);
            return Err(err);
        }
        Ok(())
    }

    /// Reverts `apply_unconfirmed`
    pub fn undo_unconfirmed(&self, transaction: &Transaction) -> TransactionResult<()> {
        let address = self.sender_address(transaction);
        let cost = self.cost_of(transaction)?;
        self.logic(transaction.kind())
            .undo_unconfirmed(&self.context(), transaction)?;
        self.ledger.merge(
            &address,
            &AccountDelta {
                u_balance: cost,
                ..Default::default()
            },
        )?;
        Ok(())
    }

    /// Whether `transaction` carries enough co-signatures to be put in a block
    pub fn ready(&self, transaction: &Transaction) -> TransactionResult<bool> {
        let address = self.sender_address(transaction);
        let sender = self
            .ledger
            .get_account(&address)?
            .unwrap_or_else(|| Account::new(address));
        Ok(self.logic(transaction.kind()).ready(transaction, &sender))
    }
}
