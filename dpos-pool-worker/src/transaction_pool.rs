// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_models::{Transaction, TransactionAsset, TransactionId};
use dpos_pool_exports::{PoolConfig, PoolError, PoolKind, PoolResult, PoolStats};
use dpos_signature::Signature;
use dpos_time::DposTime;
use std::collections::HashMap;

/// Transaction held by the pool
#[derive(Debug, Clone)]
pub(crate) struct PooledTransaction {
    pub transaction: Transaction,
    pub kind: PoolKind,
    pub received_at: DposTime,
    /// receipt rank, kept when the transaction moves between sub-pools
    pub order: u64,
    /// unconfirmed effects currently applied to the ledger
    pub applied: bool,
}

/// The four sub-pools. A transaction id belongs to at most one of them.
pub(crate) struct TransactionPool {
    config: PoolConfig,
    entries: HashMap<TransactionId, PooledTransaction>,
    next_order: u64,
}

impl TransactionPool {
    pub fn new(config: PoolConfig) -> Self {
        TransactionPool {
            config,
            entries: HashMap::new(),
            next_order: 0,
        }
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &TransactionId) -> Option<&PooledTransaction> {
        self.entries.get(id)
    }

    pub fn len(&self, kind: PoolKind) -> usize {
        self.entries.values().filter(|entry| entry.kind == kind).count()
    }

    pub fn capacity(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::Unconfirmed => self.config.max_transactions_per_block,
            _ => self.config.max_transactions_per_queue,
        }
    }

    fn check_room(&self, kind: PoolKind) -> PoolResult<()> {
        let capacity = self.capacity(kind);
        if self.len(kind) >= capacity {
            return Err(PoolError::Full {
                pool: kind,
                capacity,
            });
        }
        Ok(())
    }

    /// Adds a new transaction at the end of the receipt order
    pub fn insert(
        &mut self,
        kind: PoolKind,
        transaction: Transaction,
        received_at: DposTime,
    ) -> PoolResult<()> {
        if self.contains(&transaction.id) {
            return Err(PoolError::AlreadyInPool(transaction.id.to_string()));
        }
        self.check_room(kind)?;
        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(
            transaction.id,
            PooledTransaction {
                transaction,
                kind,
                received_at,
                order,
                applied: false,
            },
        );
        Ok(())
    }

    /// Puts back an entry taken out with `remove`, under `kind`
    pub fn reinsert(&mut self, mut entry: PooledTransaction, kind: PoolKind) -> PoolResult<()> {
        self.check_room(kind)?;
        entry.kind = kind;
        self.entries.insert(entry.transaction.id, entry);
        Ok(())
    }

    pub fn remove(&mut self, id: &TransactionId) -> Option<PooledTransaction> {
        self.entries.remove(id)
    }

    pub fn set_applied(&mut self, id: &TransactionId, applied: bool) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.applied = applied;
        }
    }

    pub fn push_signature(&mut self, id: &TransactionId, signature: Signature) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.transaction.signatures.push(signature);
        }
    }

    /// Entries of a sub-pool in receipt order
    pub fn ordered(&self, kind: PoolKind) -> Vec<&PooledTransaction> {
        let mut entries: Vec<_> = self
            .entries
            .values()
            .filter(|entry| entry.kind == kind)
            .collect();
        entries.sort_unstable_by_key(|entry| entry.order);
        entries
    }

    pub fn ordered_ids(&self, kind: PoolKind) -> Vec<TransactionId> {
        self.ordered(kind)
            .into_iter()
            .map(|entry| entry.transaction.id)
            .collect()
    }

    /// Lifetime of a pooled transaction
    pub fn timeout(&self, transaction: &Transaction) -> DposTime {
        match &transaction.asset {
            TransactionAsset::Multisignature { lifetime, .. } => {
                DposTime::from_secs(u64::from(*lifetime) * 3600)
            }
            _ if !transaction.signatures.is_empty() => self
                .config
                .transaction_timeout
                .saturating_mul(self.config.signed_transaction_timeout_factor),
            _ => self.config.transaction_timeout,
        }
    }

    /// Entries older than their lifetime at `now`, in receipt order
    pub fn expired(&self, now: DposTime) -> Vec<TransactionId> {
        let mut expired: Vec<_> = self
            .entries
            .values()
            .filter(|entry| {
                now.saturating_sub(entry.received_at) > self.timeout(&entry.transaction)
            })
            .collect();
        expired.sort_unstable_by_key(|entry| entry.order);
        expired
            .into_iter()
            .map(|entry| entry.transaction.id)
            .collect()
    }

    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats::default();
        for entry in self.entries.values() {
            match entry.kind {
                PoolKind::Unconfirmed => stats.unconfirmed += 1,
                PoolKind::Queued => stats.queued += 1,
                PoolKind::Multisignature => stats.multisignature += 1,
                PoolKind::Bundled => stats.bundled += 1,
            }
        }
        stats
    }
}
