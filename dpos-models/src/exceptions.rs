// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::transaction::TransactionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Historical transactions accepted despite failing some checks.
/// Membership is data loaded from configuration. It never derives new exemptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionTable {
    /// transactions whose signature failures are ignored
    #[serde(default)]
    pub signatures: BTreeSet<TransactionId>,
    /// transactions whose balance failures are ignored
    #[serde(default)]
    pub balances: BTreeSet<TransactionId>,
}

impl ExceptionTable {
    /// whether signature failures of `id` are ignored
    pub fn skips_signature(&self, id: &TransactionId) -> bool {
        self.signatures.contains(id)
    }

    /// whether balance failures of `id` are ignored
    pub fn skips_balance(&self, id: &TransactionId) -> bool {
        self.balances.contains(id)
    }
}
