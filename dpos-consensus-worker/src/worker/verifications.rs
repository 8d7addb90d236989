// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::ConsensusWorker;
use dpos_consensus_exports::error::{ConsensusError, ConsensusResult};
use dpos_consensus_exports::events::ConsensusEvent;
use dpos_consensus_exports::types::ForkCause;
use dpos_models::{Amount, Block, Payload};
use dpos_transactions::TransactionError;
use std::collections::HashSet;

pub(super) fn block_transaction_error(
    block: &Block,
    transaction_id: impl ToString,
    source: TransactionError,
) -> ConsensusError {
    ConsensusError::BlockTransaction {
        block_id: block.id.to_string(),
        tx_id: transaction_id.to_string(),
        source,
    }
}

impl ConsensusWorker {
    /// Checks that need nothing but the block and its parent.
    ///
    /// # Arguments
    /// * `block`: received block
    /// * `previous`: parent of the block, `None` for genesis
    pub(crate) fn verify_intrinsic(
        &self,
        block: &Block,
        previous: Option<&Block>,
    ) -> ConsensusResult<()> {
        let malformed = |reason: String| ConsensusError::MalformedBlock(block.id.to_string(), reason);
        let invalid = |reason: String| ConsensusError::InvalidBlock(block.id.to_string(), reason);
        let genesis = block.height == 1;

        if block.compute_id() != block.id {
            return Err(invalid(format!("id does not match, computed {}", block.compute_id())));
        }
        match &block.block_signature {
            Some(signature) => block
                .generator_public_key
                .verify_signature(&block.signing_hash(), signature)
                .map_err(|err| invalid(err.to_string()))?,
            None => return Err(malformed("missing signature".into())),
        }
        if block.version != self.config.block_version {
            return Err(invalid(format!("unsupported version {}", block.version)));
        }

        let expected_reward = if genesis {
            Amount::zero()
        } else {
            self.config.milestones.calc_reward(block.height)
        };
        if block.reward != expected_reward {
            return Err(invalid(format!(
                "reward {} instead of {}",
                block.reward, expected_reward
            )));
        }

        match (previous, block.previous_block) {
            (None, None) if genesis => {}
            (Some(previous), Some(previous_id))
                if previous.id == previous_id && block.height == previous.height + 1 => {}
            _ => return Err(malformed("does not link to its parent".into())),
        }

        let slot = self.clock.slot_number(block.timestamp);
        let current = self.clock.current_slot()?;
        if slot > current {
            return Err(invalid(format!("slot {} is after current slot {}", slot, current)));
        }
        if let Some(previous) = previous {
            let previous_slot = self.clock.slot_number(previous.timestamp);
            if previous.height > 1 && slot <= previous_slot {
                return Err(invalid(format!(
                    "slot {} is not after slot {} of its parent",
                    slot, previous_slot
                )));
            }
        }

        if !genesis {
            if block.payload_length > self.config.max_payload_length {
                return Err(malformed(format!("payload of {} bytes", block.payload_length)));
            }
            if block.transactions.len() > self.config.max_transactions_per_block {
                return Err(malformed(format!(
                    "{} transactions",
                    block.transactions.len()
                )));
            }
        }
        if block.number_of_transactions as usize != block.transactions.len() {
            return Err(malformed(format!(
                "declares {} transactions, carries {}",
                block.number_of_transactions,
                block.transactions.len()
            )));
        }

        let mut seen = HashSet::with_capacity(block.transactions.len());
        for transaction in &block.transactions {
            if !seen.insert(transaction.id) {
                return Err(malformed(format!("transaction {} repeated", transaction.id)));
            }
            self.engine
                .process(transaction.clone())
                .map_err(|err| block_transaction_error(block, transaction.id, err))?;
        }

        let payload = Payload::compute(&block.transactions)?;
        if payload.hash != block.payload_hash || payload.length != block.payload_length {
            return Err(invalid("payload does not match its hash".into()));
        }
        if payload.total_amount != block.total_amount || payload.total_fee != block.total_fee {
            return Err(invalid("payload totals do not match the header".into()));
        }
        Ok(())
    }

    /// Checks against the chain: the block is new, its forger is the delegate of its
    /// slot and none of its transactions is already confirmed.
    ///
    /// The forger check is skipped for genesis and when `check_forger` is false.
    pub(crate) fn verify_against_state(
        &self,
        block: &Block,
        check_forger: bool,
    ) -> ConsensusResult<()> {
        if self.storage.block_exists(&block.id)? {
            return Err(ConsensusError::DuplicateBlock(block.id.to_string()));
        }
        if check_forger && block.height > 1 {
            let slot = self.clock.slot_number(block.timestamp);
            let expected = self.state.read().rounds.get_slot_delegate(slot)?;
            if expected != block.generator_public_key {
                self.channels.broadcasts.emit(ConsensusEvent::Fork {
                    block_id: Some(block.id),
                    cause: ForkCause::WrongForger,
                });
                return Err(ConsensusError::WrongForger {
                    block_id: block.id.to_string(),
                    generator: block.generator_public_key.to_string(),
                    slot,
                    expected: expected.to_string(),
                });
            }
        }
        for transaction in &block.transactions {
            if self.storage.transaction_exists(&transaction.id)? {
                return Err(block_transaction_error(
                    block,
                    transaction.id,
                    TransactionError::AlreadyConfirmed(transaction.id.to_string()),
                ));
            }
        }
        Ok(())
    }
}
