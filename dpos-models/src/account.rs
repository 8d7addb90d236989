// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::address::Address;
use crate::amount::Amount;
use dpos_signature::PublicKey;
use serde::{Deserialize, Serialize};

/// Ledger row of an address.
///
/// Fields prefixed with `u_` are the unconfirmed tier: they include the effects of the
/// transactions applied from the pool. The others only move when a block is applied.
/// Balances are signed: the genesis sender ends up negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// address
    pub address: Address,
    /// public key, known once the account has sent a transaction
    pub public_key: Option<PublicKey>,
    /// confirmed balance
    pub balance: i64,
    /// unconfirmed balance
    pub u_balance: i64,
    /// confirmed second signature flag
    pub second_signature: bool,
    /// unconfirmed second signature flag
    pub u_second_signature: bool,
    /// confirmed second public key
    pub second_public_key: Option<PublicKey>,
    /// unconfirmed second public key
    pub u_second_public_key: Option<PublicKey>,
    /// confirmed delegate flag
    pub is_delegate: bool,
    /// unconfirmed delegate flag
    pub u_is_delegate: bool,
    /// confirmed delegate name
    pub username: Option<String>,
    /// unconfirmed delegate name
    pub u_username: Option<String>,
    /// vote weight: sum of the balances of the accounts voting for this delegate
    pub vote: i64,
    /// delegates this account votes for (confirmed)
    pub delegates: Vec<PublicKey>,
    /// delegates this account votes for (unconfirmed)
    pub u_delegates: Vec<PublicKey>,
    /// multisignature keysgroup (confirmed)
    pub multisignatures: Vec<PublicKey>,
    /// multisignature keysgroup (unconfirmed)
    pub u_multisignatures: Vec<PublicKey>,
    /// co-signatures required (confirmed)
    pub multimin: u8,
    /// co-signatures required (unconfirmed)
    pub u_multimin: u8,
    /// pending lifetime in hours (confirmed)
    pub multilifetime: u8,
    /// pending lifetime in hours (unconfirmed)
    pub u_multilifetime: u8,
    /// blocks forged
    pub produced_blocks: u64,
    /// slots missed
    pub missed_blocks: u64,
    /// forging rewards received
    pub rewards: i64,
    /// fees received
    pub fees: i64,
}

impl Account {
    /// Empty account for `address`
    pub fn new(address: Address) -> Self {
        Account {
            address,
            public_key: None,
            balance: 0,
            u_balance: 0,
            second_signature: false,
            u_second_signature: false,
            second_public_key: None,
            u_second_public_key: None,
            is_delegate: false,
            u_is_delegate: false,
            username: None,
            u_username: None,
            vote: 0,
            delegates: Vec::new(),
            u_delegates: Vec::new(),
            multisignatures: Vec::new(),
            u_multisignatures: Vec::new(),
            multimin: 0,
            u_multimin: 0,
            multilifetime: 0,
            u_multilifetime: 0,
            produced_blocks: 0,
            missed_blocks: 0,
            rewards: 0,
            fees: 0,
        }
    }

    /// Whether the confirmed balance covers `cost`
    pub fn can_spend(&self, cost: Amount) -> bool {
        i128::from(self.balance) >= i128::from(cost.to_raw())
    }

    /// Whether the unconfirmed balance covers `cost`
    pub fn can_spend_unconfirmed(&self, cost: Amount) -> bool {
        i128::from(self.u_balance) >= i128::from(cost.to_raw())
    }

    /// Whether the account is a registered multisignature account
    pub fn is_multisignature(&self) -> bool {
        !self.multisignatures.is_empty()
    }
}
