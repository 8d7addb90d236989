// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::transaction_pool::{PooledTransaction, TransactionPool};
use dpos_models::{Transaction, TransactionId, TransactionType};
use dpos_pool_exports::{PoolConfig, PoolController, PoolError, PoolKind, PoolResult, PoolStats};
use dpos_sequence::Sequence;
use dpos_signature::Signature;
use dpos_time::DposTime;
use dpos_transactions::TransactionEngine;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Pool controller. Clones share the same pool.
#[derive(Clone)]
pub struct PoolControllerImpl {
    pub(crate) config: PoolConfig,
    pub(crate) pool: Arc<RwLock<TransactionPool>>,
    pub(crate) engine: TransactionEngine,
    /// sequence owning the unconfirmed tier
    pub(crate) balances: Sequence,
}

impl PoolControllerImpl {
    /// Runs `task` in the balances sequence and waits for it
    fn in_balances<T, F>(&self, task: F) -> PoolResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&PoolControllerImpl) -> PoolResult<T> + Send + 'static,
    {
        let this = self.clone();
        self.balances.add_and_wait(move || task(&this))?
    }

    /// Shape and ledger checks, then the sub-pool the transaction belongs to
    fn classify(&self, transaction: Transaction) -> PoolResult<(Transaction, PoolKind)> {
        let transaction = self.engine.process(transaction)?;
        let sender = self.engine.verify(&transaction)?;
        let kind = if transaction.kind() == TransactionType::Multisignature
            || sender.is_multisignature()
            || !transaction.signatures.is_empty()
        {
            PoolKind::Multisignature
        } else {
            PoolKind::Queued
        };
        Ok((transaction, kind))
    }

    fn admit(&self, transaction: Transaction, bundled: bool) -> PoolResult<()> {
        let received_at = DposTime::now()?;
        if self.pool.read().contains(&transaction.id) {
            return Err(PoolError::AlreadyInPool(transaction.id.to_string()));
        }
        if bundled {
            return self
                .pool
                .write()
                .insert(PoolKind::Bundled, transaction, received_at);
        }
        let (transaction, kind) = self.classify(transaction)?;
        let id = transaction.id;
        self.pool.write().insert(kind, transaction, received_at)?;
        debug!("transaction {} added to the {:?} pool", id, kind);
        Ok(())
    }

    fn fill(&self) -> PoolResult<usize> {
        let candidates = {
            let pool = self.pool.read();
            let room = pool
                .capacity(PoolKind::Unconfirmed)
                .saturating_sub(pool.len(PoolKind::Unconfirmed));
            if room == 0 {
                return Ok(0);
            }
            let mut candidates: Vec<TransactionId> = pool
                .ordered(PoolKind::Multisignature)
                .into_iter()
                .filter(|entry| matches!(self.engine.ready(&entry.transaction), Ok(true)))
                .take(self.config.max_multisignature_fill)
                .map(|entry| entry.transaction.id)
                .collect();
            candidates.extend(pool.ordered_ids(PoolKind::Queued));
            candidates.truncate(room);
            candidates
        };

        let mut promoted = 0;
        for id in candidates {
            let removed = self.pool.write().remove(&id);
            let Some(mut entry) = removed else {
                continue;
            };
            let applied = self
                .engine
                .verify(&entry.transaction)
                .and_then(|_| self.engine.apply_unconfirmed(&entry.transaction, false));
            if let Err(err) = applied {
                debug!("transaction {} dropped from the pool: {}", id, err);
                continue;
            }
            entry.applied = true;
            let reinserted = self.pool.write().reinsert(entry.clone(), PoolKind::Unconfirmed);
            if let Err(err) = reinserted {
                warn!("could not promote transaction {}: {}", id, err);
                self.undo_entry(&entry);
                continue;
            }
            promoted += 1;
        }
        Ok(promoted)
    }

    fn undo_entry(&self, entry: &PooledTransaction) {
        if !entry.applied {
            return;
        }
        if let Err(err) = self.engine.undo_unconfirmed(&entry.transaction) {
            error!(
                "could not undo unconfirmed transaction {}: {}",
                entry.transaction.id, err
            );
        }
    }

    /// Drops every transaction expired at `now`
    pub(crate) fn expire_at(&self, now: DposTime) -> PoolResult<Vec<TransactionId>> {
        self.in_balances(move |this| {
            let expired = this.pool.read().expired(now);
            for id in &expired {
                let removed = this.pool.write().remove(id);
                if let Some(entry) = removed {
                    this.undo_entry(&entry);
                    debug!("transaction {} expired from the {:?} pool", id, entry.kind);
                }
            }
            Ok(expired)
        })
    }

    fn sign(&self, transaction_id: TransactionId, signature: Signature) -> PoolResult<()> {
        let mut candidate = match self.pool.read().get(&transaction_id) {
            Some(entry) if entry.kind == PoolKind::Multisignature => entry.transaction.clone(),
            _ => return Err(PoolError::NotPending(transaction_id.to_string())),
        };
        if candidate.signatures.contains(&signature) {
            return Err(PoolError::DuplicateSignature(transaction_id.to_string()));
        }
        candidate.signatures.push(signature.clone());
        self.engine.verify(&candidate)?;
        self.pool.write().push_signature(&transaction_id, signature);
        debug!(
            "transaction {} now carries {} co-signatures",
            transaction_id,
            candidate.signatures.len()
        );
        Ok(())
    }

    fn verify_bundled(&self) -> PoolResult<usize> {
        let batch: Vec<TransactionId> = self
            .pool
            .read()
            .ordered_ids(PoolKind::Bundled)
            .into_iter()
            .take(self.config.bundle_limit)
            .collect();
        let mut routed = 0;
        for id in batch {
            let removed = self.pool.write().remove(&id);
            let Some(mut entry) = removed else {
                continue;
            };
            match self.classify(entry.transaction.clone()) {
                Ok((transaction, kind)) => {
                    entry.transaction = transaction;
                    let reinserted = self.pool.write().reinsert(entry, kind);
                    match reinserted {
                        Ok(()) => routed += 1,
                        Err(err) => debug!("bundled transaction {} dropped: {}", id, err),
                    }
                }
                Err(err) => debug!("bundled transaction {} rejected: {}", id, err),
            }
        }
        Ok(routed)
    }

    fn undo_list(&self) -> PoolResult<Vec<TransactionId>> {
        let applied: Vec<PooledTransaction> = self
            .pool
            .read()
            .ordered(PoolKind::Unconfirmed)
            .into_iter()
            .filter(|entry| entry.applied)
            .cloned()
            .collect();
        let mut undone = Vec::with_capacity(applied.len());
        for entry in applied.iter().rev() {
            let id = entry.transaction.id;
            match self.engine.undo_unconfirmed(&entry.transaction) {
                Ok(()) => {
                    self.pool.write().set_applied(&id, false);
                    undone.push(id);
                }
                Err(err) => {
                    error!("could not undo unconfirmed transaction {}: {}", id, err);
                    self.pool.write().remove(&id);
                }
            }
        }
        Ok(undone)
    }

    fn apply_list(&self) -> PoolResult<Vec<TransactionId>> {
        let pending: Vec<PooledTransaction> = self
            .pool
            .read()
            .ordered(PoolKind::Unconfirmed)
            .into_iter()
            .filter(|entry| !entry.applied)
            .cloned()
            .collect();
        let mut dropped = Vec::new();
        for entry in pending {
            let id = entry.transaction.id;
            let applied = self
                .engine
                .verify(&entry.transaction)
                .and_then(|_| self.engine.apply_unconfirmed(&entry.transaction, false));
            match applied {
                Ok(()) => self.pool.write().set_applied(&id, true),
                Err(err) => {
                    debug!("unconfirmed transaction {} dropped: {}", id, err);
                    self.pool.write().remove(&id);
                    dropped.push(id);
                }
            }
        }
        Ok(dropped)
    }

    fn admit_all(&self, transactions: Vec<Transaction>, bundled: bool) -> usize {
        transactions
            .into_iter()
            .filter_map(|transaction| {
                let id = transaction.id;
                self.admit(transaction, bundled)
                    .map_err(|err| debug!("transaction {} refused: {}", id, err))
                    .ok()
            })
            .count()
    }
}

impl PoolController for PoolControllerImpl {
    fn add_transaction(&self, transaction: Transaction, bundled: bool) -> PoolResult<()> {
        self.in_balances(move |this| this.admit(transaction, bundled))
    }

    fn receive_transactions(&self, transactions: Vec<Transaction>, bundled: bool) -> usize {
        self.in_balances(move |this| Ok(this.admit_all(transactions, bundled)))
            .unwrap_or_else(|err| {
                warn!("received transactions not processed: {}", err);
                0
            })
    }

    fn fill_pool(&self) -> PoolResult<usize> {
        self.in_balances(|this| this.fill())
    }

    fn expire_transactions(&self) -> PoolResult<Vec<TransactionId>> {
        self.expire_at(DposTime::now()?)
    }

    fn add_signature(&self, transaction_id: TransactionId, signature: Signature) -> PoolResult<()> {
        self.in_balances(move |this| this.sign(transaction_id, signature))
    }

    fn process_bundled(&self) -> PoolResult<usize> {
        self.in_balances(|this| this.verify_bundled())
    }

    fn undo_unconfirmed_list(&self) -> PoolResult<Vec<TransactionId>> {
        self.in_balances(|this| this.undo_list())
    }

    fn apply_unconfirmed_list(&self) -> PoolResult<Vec<TransactionId>> {
        self.in_balances(|this| this.apply_list())
    }

    fn remove_transactions(&self, transaction_ids: Vec<TransactionId>) {
        let removed = self.in_balances(move |this| {
            for id in &transaction_ids {
                let removed = this.pool.write().remove(id);
                if let Some(entry) = removed {
                    this.undo_entry(&entry);
                }
            }
            Ok(())
        });
        if let Err(err) = removed {
            warn!("could not remove confirmed transactions from the pool: {}", err);
        }
    }

    fn return_transactions(&self, transactions: Vec<Transaction>) -> usize {
        self.receive_transactions(transactions, false)
    }

    fn transaction_in_pool(&self, transaction_id: &TransactionId) -> bool {
        self.pool.read().contains(transaction_id)
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Option<Transaction> {
        self.pool
            .read()
            .get(transaction_id)
            .map(|entry| entry.transaction.clone())
    }

    fn get_block_transactions(&self, limit: usize) -> Vec<Transaction> {
        self.pool
            .read()
            .ordered(PoolKind::Unconfirmed)
            .into_iter()
            .filter(|entry| entry.applied)
            .take(limit)
            .map(|entry| entry.transaction.clone())
            .collect()
    }

    fn get_stats(&self) -> PoolStats {
        self.pool.read().stats()
    }

    fn clone_box(&self) -> Box<dyn PoolController> {
        Box::new(self.clone())
    }
}
