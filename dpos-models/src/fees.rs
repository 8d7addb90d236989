// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::amount::Amount;
use crate::config::constants::{
    DELEGATE_FEE, MULTISIGNATURE_FEE, SECOND_SIGNATURE_FEE, TRANSFER_FEE, VOTE_FEE,
};
use serde::{Deserialize, Serialize};

/// Minimum fee of each transaction type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// transfer
    pub transfer: Amount,
    /// second signature registration
    pub second_signature: Amount,
    /// delegate registration
    pub delegate: Amount,
    /// vote
    pub vote: Amount,
    /// multisignature registration, charged once per key plus once for the sender
    pub multisignature: Amount,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            transfer: TRANSFER_FEE,
            second_signature: SECOND_SIGNATURE_FEE,
            delegate: DELEGATE_FEE,
            vote: VOTE_FEE,
            multisignature: MULTISIGNATURE_FEE,
        }
    }
}
