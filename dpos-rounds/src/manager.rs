// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::RoundsConfig;
use crate::error::{RoundsError, RoundsResult};
use crate::shuffle::shuffle_delegates;
use dpos_ledger::LedgerController;
use dpos_logging::dpos_trace;
use dpos_models::rounds::{calc_round, first_height_of_round, is_last_height_of_round};
use dpos_models::{
    Account, AccountDelta, Address, Amount, Block, BlockTag, DelegateSnapshot, RoundSnapshot,
};
use dpos_signature::PublicKey;
use dpos_storage::StorageController;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// In-memory state of the round in progress
#[derive(Debug, Clone)]
struct RoundState {
    round: u64,
    /// forging order
    active: Vec<PublicKey>,
    /// generators of the blocks applied in this round, genesis excluded
    forgers: Vec<PublicKey>,
    fee_pool: Amount,
}

/// Forging record of a delegate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForgingStats {
    /// blocks forged
    pub produced_blocks: u64,
    /// slots missed
    pub missed_blocks: u64,
    /// rewards received
    pub rewards: i64,
    /// fees received
    pub fees: i64,
    /// produced blocks over assigned slots, in percent
    pub productivity: f64,
}

/// Keeps the active delegate set of the current round and performs the round bookkeeping
/// of each applied or removed block.
///
/// Every ledger change made at a round boundary is recorded in the snapshot of the opened
/// round, so that removing the closing block replays its negation.
pub struct RoundManager {
    config: RoundsConfig,
    ledger: Box<dyn LedgerController>,
    storage: Box<dyn StorageController>,
    /// last ticked height, 0 before genesis
    height: u32,
    state: Option<RoundState>,
}

/// Ranking order: vote weight descending, then public key ascending
fn rank(left: &DelegateSnapshot, right: &DelegateSnapshot) -> Ordering {
    right
        .vote
        .cmp(&left.vote)
        .then_with(|| left.public_key.cmp(&right.public_key))
}

impl RoundManager {
    /// Manager with no round loaded. Call `load` for an existing chain.
    pub fn new(
        config: RoundsConfig,
        ledger: Box<dyn LedgerController>,
        storage: Box<dyn StorageController>,
    ) -> Self {
        RoundManager {
            config,
            ledger,
            storage,
            height: 0,
            state: None,
        }
    }

    /// Size of the active set
    pub fn delegates(&self) -> usize {
        self.config.delegates
    }

    /// Last ticked height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Round of the next block
    pub fn current_round(&self) -> u64 {
        calc_round(self.height.saturating_add(1), self.config.delegates)
    }

    /// Restores the state of a chain whose last block is at `last_height`
    pub fn load(&mut self, last_height: u32) -> RoundsResult<()> {
        self.height = last_height;
        if last_height == 0 {
            self.state = None;
            return Ok(());
        }
        let round = self.current_round();
        self.state = Some(self.rebuild_round(round, last_height)?);
        info!("round {} loaded at height {}", round, last_height);
        Ok(())
    }

    /// Active set of `round` from its snapshot, with the forgers and fees of its stored
    /// blocks up to `up_to_height`
    fn rebuild_round(&self, round: u64, up_to_height: u32) -> RoundsResult<RoundState> {
        let snapshot = self
            .storage
            .get_round_snapshot(round)?
            .ok_or(RoundsError::MissingSnapshot(round))?;
        let first = first_height_of_round(round, self.config.delegates).max(2);
        let mut state = RoundState {
            round,
            active: snapshot
                .delegates
                .into_iter()
                .map(|delegate| delegate.public_key)
                .collect(),
            forgers: Vec::new(),
            fee_pool: Amount::zero(),
        };
        if up_to_height >= first {
            let count = (up_to_height - first + 1) as usize;
            for block in self.storage.get_blocks_after(first - 1, count)? {
                state.forgers.push(block.generator_public_key);
                state.fee_pool = state.fee_pool.saturating_add(block.total_fee);
            }
        }
        Ok(state)
    }

    /// Forging order of the round of the next block
    pub fn active_delegates(&self) -> RoundsResult<Vec<PublicKey>> {
        match &self.state {
            Some(state) if state.round == self.current_round() => Ok(state.active.clone()),
            _ => Ok(self
                .rebuild_round(self.current_round(), self.height)?
                .active),
        }
    }

    /// Delegate assigned to `slot`
    pub fn get_slot_delegate(&self, slot: u64) -> RoundsResult<PublicKey> {
        let active = self.active_delegates()?;
        if active.is_empty() {
            return Err(RoundsError::Inconsistent("empty active set".into()));
        }
        Ok(active[(slot % active.len() as u64) as usize])
    }

    /// Fees collected in the round in progress
    pub fn fee_pool(&self) -> Amount {
        self.state
            .as_ref()
            .map(|state| state.fee_pool)
            .unwrap_or_default()
    }

    /// Forging record of the delegate `public_key`, if it has an account
    pub fn get_forging_stats(&self, public_key: &PublicKey) -> RoundsResult<Option<ForgingStats>> {
        Ok(self
            .ledger
            .get_account_by_public_key(public_key)?
            .map(|account| {
                let assigned = account.produced_blocks + account.missed_blocks;
                ForgingStats {
                    produced_blocks: account.produced_blocks,
                    missed_blocks: account.missed_blocks,
                    rewards: account.rewards,
                    fees: account.fees,
                    productivity: if assigned == 0 {
                        0.0
                    } else {
                        account.produced_blocks as f64 * 100.0 / assigned as f64
                    },
                }
            }))
    }

    fn address_of(&self, public_key: &PublicKey) -> Address {
        Address::from_public_key(public_key, self.config.address_version)
    }

    fn forger_delta(block: &Block) -> RoundsResult<AccountDelta> {
        let earned = block
            .reward
            .checked_add(block.total_fee)
            .ok_or_else(|| RoundsError::Inconsistent(format!("block {} earnings overflow", block.id)))?
            .to_signed();
        Ok(AccountDelta {
            balance: earned,
            u_balance: earned,
            rewards: block.reward.to_signed(),
            fees: block.total_fee.to_signed(),
            ..Default::default()
        })
    }

    /// Round bookkeeping of an applied block. Returns the round opened by this block, if any.
    pub fn tick(&mut self, block: &Block) -> RoundsResult<Option<u64>> {
        if block.height != self.height + 1 {
            return Err(RoundsError::UnexpectedHeight {
                height: block.height,
                last: self.height,
            });
        }
        let round = calc_round(block.height, self.config.delegates);
        let tag = BlockTag {
            block_id: block.id,
            round,
            genesis: block.height == 1,
        };

        let mut opened = None;
        if block.height == 1 {
            // genesis opens round 1 from its own vote effects, without forger
            self.open_round(1, Vec::new(), tag)?;
            opened = Some(1);
        } else {
            let mut state = match self.state.take() {
                Some(state) if state.round == round => state,
                _ => self.rebuild_round(round, block.height - 1)?,
            };
            let delta = Self::forger_delta(block)?.tagged(Some(tag));
            if let Err(err) = self
                .ledger
                .merge(&self.address_of(&block.generator_public_key), &delta)
            {
                self.state = Some(state);
                return Err(err.into());
            }
            state.fee_pool = state.fee_pool.saturating_add(block.total_fee);
            state.forgers.push(block.generator_public_key);
            self.state = Some(state);
        }
        self.height = block.height;

        if is_last_height_of_round(block.height, self.config.delegates) {
            let finished = self.state.as_ref().map(|state| {
                (state.active.clone(), state.forgers.clone())
            });
            let (active, forgers) = finished.unwrap_or_default();
            let stats = self.forging_deltas(&active, &forgers);
            match self.open_round(round + 1, stats, tag) {
                Ok(()) => opened = Some(round + 1),
                Err(err) => {
                    self.height = block.height - 1;
                    if block.height > 1 {
                        self.undo_forger(block, tag)?;
                        if let Some(state) = self.state.as_mut() {
                            state.forgers.pop();
                            state.fee_pool = state.fee_pool.saturating_sub(block.total_fee);
                        }
                    } else {
                        self.state = None;
                    }
                    return Err(err);
                }
            }
        }
        debug!("round tick at height {} (round {})", block.height, round);
        Ok(opened)
    }

    /// Produced and missed block increments of a finished round
    fn forging_deltas(
        &self,
        active: &[PublicKey],
        forgers: &[PublicKey],
    ) -> Vec<(Address, AccountDelta)> {
        let produced = forgers.iter().map(|forger| {
            (
                self.address_of(forger),
                AccountDelta {
                    produced_blocks: 1,
                    ..Default::default()
                },
            )
        });
        let missed = active
            .iter()
            .filter(|delegate| !forgers.contains(delegate))
            .map(|delegate| {
                (
                    self.address_of(delegate),
                    AccountDelta {
                        missed_blocks: 1,
                        ..Default::default()
                    },
                )
            });
        produced.chain(missed).collect()
    }

    /// Vote weight of each delegate recomputed from the confirmed balances of its voters
    fn vote_deltas(&self, delegates: &[Account]) -> RoundsResult<Vec<(Address, AccountDelta, i64)>> {
        let mut deltas = Vec::with_capacity(delegates.len());
        for delegate in delegates {
            let public_key = match delegate.public_key {
                Some(public_key) => public_key,
                None => {
                    warn!("delegate {} has no public key, skipped", delegate.address);
                    continue;
                }
            };
            let mut vote: i64 = 0;
            for voter in self.ledger.accounts_voting_for(&public_key)? {
                vote = vote.checked_add(voter.balance).ok_or_else(|| {
                    RoundsError::Inconsistent(format!("vote weight of {} overflows", public_key))
                })?;
            }
            let delta = vote - delegate.vote;
            deltas.push((
                delegate.address,
                AccountDelta {
                    vote: delta,
                    ..Default::default()
                },
                vote,
            ));
        }
        Ok(deltas)
    }

    /// Closes the round before `round` and opens `round`: merges `stats`, recomputes votes,
    /// ranks, shuffles and persists the snapshot. Nothing is merged if there are not enough
    /// delegates.
    fn open_round(
        &mut self,
        round: u64,
        stats: Vec<(Address, AccountDelta)>,
        tag: BlockTag,
    ) -> RoundsResult<()> {
        let delegates = self.ledger.get_delegates()?;
        if delegates.len() < self.config.delegates {
            return Err(RoundsError::NotEnoughDelegates {
                found: delegates.len(),
                required: self.config.delegates,
            });
        }
        let votes = self.vote_deltas(&delegates)?;

        let mut ranking: Vec<DelegateSnapshot> = delegates
            .iter()
            .filter_map(|account| {
                let public_key = account.public_key?;
                let vote = votes
                    .iter()
                    .find(|(address, _, _)| *address == account.address)
                    .map(|(_, _, vote)| *vote)
                    .unwrap_or(account.vote);
                Some(DelegateSnapshot { public_key, vote })
            })
            .collect();
        if ranking.len() < self.config.delegates {
            return Err(RoundsError::NotEnoughDelegates {
                found: ranking.len(),
                required: self.config.delegates,
            });
        }
        ranking.sort_by(rank);
        ranking.truncate(self.config.delegates);

        let order = shuffle_delegates(
            round,
            ranking.iter().map(|delegate| delegate.public_key).collect(),
        );
        let delegates: Vec<DelegateSnapshot> = order
            .iter()
            .filter_map(|public_key| {
                ranking
                    .iter()
                    .find(|delegate| delegate.public_key == *public_key)
                    .cloned()
            })
            .collect();

        let opening_deltas: Vec<(Address, AccountDelta)> = stats
            .into_iter()
            .chain(
                votes
                    .into_iter()
                    .filter(|(_, delta, _)| !delta.is_empty())
                    .map(|(address, delta, _)| (address, delta)),
            )
            .map(|(address, delta)| (address, delta.tagged(Some(tag))))
            .collect();
        let mut merged: Vec<&(Address, AccountDelta)> = Vec::with_capacity(opening_deltas.len());
        for entry in &opening_deltas {
            if let Err(err) = self.ledger.merge(&entry.0, &entry.1) {
                self.revert_deltas(merged.into_iter().rev());
                return Err(err.into());
            }
            merged.push(entry);
        }

        let snapshot = RoundSnapshot {
            round,
            delegates,
            opening_deltas,
        };
        if let Err(err) = self.storage.save_round_snapshot(snapshot.clone()) {
            self.revert_deltas(snapshot.opening_deltas.iter().rev());
            return Err(err.into());
        }
        self.state = Some(RoundState {
            round,
            active: order,
            forgers: Vec::new(),
            fee_pool: Amount::zero(),
        });
        info!("round {} opened", round);
        dpos_trace!("rounds.opened", {
            "round": round,
            "block_id": tag.block_id.to_string()
        });
        Ok(())
    }

    fn revert_deltas<'a>(&self, deltas: impl Iterator<Item = &'a (Address, AccountDelta)>) {
        for (address, delta) in deltas {
            if let Err(err) = self.ledger.merge(address, &delta.negated()) {
                warn!("could not revert round change of {}: {}", address, err);
            }
        }
    }

    fn undo_forger(&self, block: &Block, tag: BlockTag) -> RoundsResult<()> {
        let delta = Self::forger_delta(block)?.negated().tagged(Some(tag));
        self.ledger
            .merge(&self.address_of(&block.generator_public_key), &delta)?;
        Ok(())
    }

    /// Exact inverse of `tick` for the last block. Returns the round discarded by the
    /// removal, if the block had opened one.
    pub fn backward_tick(&mut self, block: &Block) -> RoundsResult<Option<u64>> {
        if block.height <= 1 {
            return Err(RoundsError::CannotRevertGenesis);
        }
        if block.height != self.height {
            return Err(RoundsError::UnexpectedHeight {
                height: block.height,
                last: self.height,
            });
        }
        let round = calc_round(block.height, self.config.delegates);
        let tag = BlockTag {
            block_id: block.id,
            round,
            genesis: false,
        };

        let mut discarded = None;
        if is_last_height_of_round(block.height, self.config.delegates) {
            let next = self
                .storage
                .get_round_snapshot(round + 1)?
                .ok_or(RoundsError::MissingSnapshot(round + 1))?;
            for (address, delta) in next.opening_deltas.iter().rev() {
                self.ledger.merge(address, &delta.negated())?;
            }
            self.storage.delete_round_snapshot(round + 1)?;
            self.state = None;
            discarded = Some(round + 1);
        }

        let mut state = match self.state.take() {
            Some(state) if state.round == round => state,
            _ => self.rebuild_round(round, block.height)?,
        };
        if state.forgers.last() != Some(&block.generator_public_key) {
            self.state = Some(state);
            return Err(RoundsError::Inconsistent(format!(
                "block {} is not the last forged of round {}",
                block.id, round
            )));
        }
        self.undo_forger(block, tag)?;
        state.forgers.pop();
        state.fee_pool = state.fee_pool.saturating_sub(block.total_fee);
        self.height = block.height - 1;

        if block.height == first_height_of_round(round, self.config.delegates) {
            // the next block opens this round again: reload it from its snapshot
            self.state = Some(self.rebuild_round(round, self.height)?);
        } else {
            self.state = Some(state);
        }
        debug!("round backward tick at height {}", block.height);
        Ok(discarded)
    }
}
