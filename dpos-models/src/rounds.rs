// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! A round is a run of `delegates` consecutive heights sharing one forging order.
//! Heights start at 1 (genesis), rounds start at 1.

use crate::address::Address;
use crate::delta::AccountDelta;
use dpos_signature::PublicKey;
use serde::{Deserialize, Serialize};

/// Active delegate of a round with its vote weight at round start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateSnapshot {
    /// delegate key
    pub public_key: PublicKey,
    /// vote weight when the round started
    pub vote: i64,
}

/// Persisted state of a round start.
///
/// `delegates` is in forging order. `opening_deltas` are the ledger changes made when the
/// previous round was closed (forging counters, vote weights), kept so that the close can be
/// reverted exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// round number
    pub round: u64,
    /// active delegates in forging order
    pub delegates: Vec<DelegateSnapshot>,
    /// changes applied when this round was opened
    pub opening_deltas: Vec<(Address, AccountDelta)>,
}

/// Round containing `height`
///
/// ```
/// # use dpos_models::rounds::calc_round;
/// assert_eq!(calc_round(1, 51), 1);
/// assert_eq!(calc_round(51, 51), 1);
/// assert_eq!(calc_round(52, 51), 2);
/// ```
pub fn calc_round(height: u32, delegates: usize) -> u64 {
    (height.saturating_sub(1) as u64) / (delegates as u64) + 1
}

/// First height of `round`
pub fn first_height_of_round(round: u64, delegates: usize) -> u32 {
    (round.saturating_sub(1) * delegates as u64 + 1) as u32
}

/// Last height of `round`
pub fn last_height_of_round(round: u64, delegates: usize) -> u32 {
    (round * delegates as u64) as u32
}

/// Whether the block at `height` closes its round
pub fn is_last_height_of_round(height: u32, delegates: usize) -> bool {
    height as u64 == last_height_of_round(calc_round(height, delegates), delegates) as u64
}
