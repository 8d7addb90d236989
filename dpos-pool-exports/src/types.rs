// Copyright (c) 2022 MASSA LABS <info@massa.net>

use serde::Serialize;

/// Sub-pool of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PoolKind {
    /// applied to the unconfirmed tier
    Unconfirmed,
    /// verified, waiting for promotion
    Queued,
    /// waiting for co-signatures
    Multisignature,
    /// not verified yet
    Bundled,
}

/// Number of transactions in each sub-pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// unconfirmed pool
    pub unconfirmed: usize,
    /// queued pool
    pub queued: usize,
    /// multisignature pool
    pub multisignature: usize,
    /// bundled pool
    pub bundled: usize,
}

impl PoolStats {
    /// Transactions in all sub-pools
    pub fn total(&self) -> usize {
        self.unconfirmed + self.queued + self.multisignature + self.bundled
    }
}
