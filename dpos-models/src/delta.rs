// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::block::BlockTag;
use crate::transaction::{SetAction, SetEntry};
use serde::{Deserialize, Serialize};

/// Transition of a non-numeric account field.
///
/// Both ends are recorded so that the change can be inverted without reading the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldChange<T> {
    /// leave the field untouched
    #[default]
    Keep,
    /// the field goes from `from` to `to`
    Set {
        /// value before the change
        from: T,
        /// value after the change
        to: T,
    },
}

impl<T: Clone> FieldChange<T> {
    /// Change from `from` to `to`
    pub fn set(from: T, to: T) -> Self {
        FieldChange::Set { from, to }
    }

    /// Inverse change
    pub fn negated(&self) -> Self {
        match self {
            FieldChange::Keep => FieldChange::Keep,
            FieldChange::Set { from, to } => FieldChange::Set {
                from: to.clone(),
                to: from.clone(),
            },
        }
    }

    /// Writes the new value into `field`
    pub fn apply_to(&self, field: &mut T) {
        if let FieldChange::Set { to, .. } = self {
            *field = to.clone();
        }
    }
}

/// Change of one account, applied by the ledger merge.
///
/// Numeric fields are signed deltas. Set fields are ordered lists of additions and removals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountDelta {
    /// confirmed balance delta
    pub balance: i64,
    /// unconfirmed balance delta
    pub u_balance: i64,
    /// vote weight delta
    pub vote: i64,
    /// received rewards delta
    pub rewards: i64,
    /// received fees delta
    pub fees: i64,
    /// forged blocks delta
    pub produced_blocks: i64,
    /// missed slots delta
    pub missed_blocks: i64,
    /// confirmed votes
    pub delegates: Vec<SetEntry>,
    /// unconfirmed votes
    pub u_delegates: Vec<SetEntry>,
    /// confirmed multisignature keysgroup
    pub multisignatures: Vec<SetEntry>,
    /// unconfirmed multisignature keysgroup
    pub u_multisignatures: Vec<SetEntry>,
    /// confirmed second signature flag
    pub second_signature: FieldChange<bool>,
    /// unconfirmed second signature flag
    pub u_second_signature: FieldChange<bool>,
    /// confirmed second public key
    pub second_public_key: FieldChange<Option<dpos_signature::PublicKey>>,
    /// unconfirmed second public key
    pub u_second_public_key: FieldChange<Option<dpos_signature::PublicKey>>,
    /// confirmed delegate flag
    pub is_delegate: FieldChange<bool>,
    /// unconfirmed delegate flag
    pub u_is_delegate: FieldChange<bool>,
    /// confirmed delegate name
    pub username: FieldChange<Option<String>>,
    /// unconfirmed delegate name
    pub u_username: FieldChange<Option<String>>,
    /// confirmed multisignature minimum
    pub multimin: FieldChange<u8>,
    /// unconfirmed multisignature minimum
    pub u_multimin: FieldChange<u8>,
    /// confirmed multisignature lifetime
    pub multilifetime: FieldChange<u8>,
    /// unconfirmed multisignature lifetime
    pub u_multilifetime: FieldChange<u8>,
    /// block and round that produced this change, if confirmed
    pub tag: Option<BlockTag>,
}

fn negate_entries(entries: &[SetEntry]) -> Vec<SetEntry> {
    entries
        .iter()
        .rev()
        .map(|entry| SetEntry {
            action: match entry.action {
                SetAction::Add => SetAction::Remove,
                SetAction::Remove => SetAction::Add,
            },
            public_key: entry.public_key,
        })
        .collect()
}

impl AccountDelta {
    /// Delta moving both balances by `amount`
    pub fn balances(amount: i64) -> Self {
        AccountDelta {
            balance: amount,
            u_balance: amount,
            ..Default::default()
        }
    }

    /// Same delta tagged with a block
    pub fn tagged(mut self, tag: Option<BlockTag>) -> Self {
        self.tag = tag;
        self
    }

    /// Exact inverse: merging a delta then its negation restores the account
    ///
    /// ```
    /// # use dpos_models::delta::AccountDelta;
    /// let delta = AccountDelta { balance: 5, vote: -3, ..Default::default() };
    /// assert_eq!(delta.negated().negated(), delta);
    /// assert_eq!(delta.negated().balance, -5);
    /// ```
    pub fn negated(&self) -> Self {
        AccountDelta {
            balance: -self.balance,
            u_balance: -self.u_balance,
            vote: -self.vote,
            rewards: -self.rewards,
            fees: -self.fees,
            produced_blocks: -self.produced_blocks,
            missed_blocks: -self.missed_blocks,
            delegates: negate_entries(&self.delegates),
            u_delegates: negate_entries(&self.u_delegates),
            multisignatures: negate_entries(&self.multisignatures),
            u_multisignatures: negate_entries(&self.u_multisignatures),
            second_signature: self.second_signature.negated(),
            u_second_signature: self.u_second_signature.negated(),
            second_public_key: self.second_public_key.negated(),
            u_second_public_key: self.u_second_public_key.negated(),
            is_delegate: self.is_delegate.negated(),
            u_is_delegate: self.u_is_delegate.negated(),
            username: self.username.negated(),
            u_username: self.u_username.negated(),
            multimin: self.multimin.negated(),
            u_multimin: self.u_multimin.negated(),
            multilifetime: self.multilifetime.negated(),
            u_multilifetime: self.u_multilifetime.negated(),
            tag: self.tag,
        }
    }

    /// Whether merging this delta changes nothing but the tag
    pub fn is_empty(&self) -> bool {
        let untagged = AccountDelta {
            tag: None,
            ..self.clone()
        };
        untagged == AccountDelta::default()
    }
}
