// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::verifications::block_transaction_error;
use super::ConsensusWorker;
use dpos_consensus_exports::error::{ConsensusError, ConsensusResult};
use dpos_consensus_exports::events::ConsensusEvent;
use dpos_logging::dpos_trace;
use dpos_models::rounds::calc_round;
use dpos_models::{Block, BlockId, BlockTag, Transaction};
use dpos_transactions::TransactionError;
use tracing::{debug, error, info};

/// How far `apply_block` went, used to unwind a failed application
#[derive(Default)]
struct Progress {
    rewound_pool: bool,
    unconfirmed: usize,
    confirmed: usize,
    persisted: bool,
}

impl ConsensusWorker {
    fn tag_of(&self, block: &Block) -> BlockTag {
        BlockTag {
            block_id: block.id,
            round: calc_round(block.height, self.state.read().rounds.delegates()),
            genesis: block.height == 1,
        }
    }

    /// Verifies `block` and applies it as the new tip.
    ///
    /// Ledger, round and pool changes run in the balances sequence. On error nothing
    /// is left applied, unless the error is fatal.
    ///
    /// # Returns
    /// The round opened by the block, if any
    pub(crate) fn process_block(&self, block: Block, check_forger: bool) -> ConsensusResult<Option<u64>> {
        let previous = match block.height {
            1 => None,
            _ => Some(self.last_block()),
        };
        self.verify_intrinsic(&block, previous.as_ref())?;
        self.verify_against_state(&block, check_forger)?;
        self.channels
            .broadcasts
            .emit(ConsensusEvent::BlockVerified { block_id: block.id });

        let worker = self.clone();
        let applied = block.clone();
        let opened = self
            .balances
            .add_and_wait(move || worker.apply_block(&applied))??;

        info!(
            "block {} applied at height {} with {} transactions",
            block.id,
            block.height,
            block.transactions.len()
        );
        dpos_trace!("consensus.block_processed", {
            "block_id": block.id.to_string(),
            "height": block.height
        });
        let (block_id, height) = (block.id, block.height);
        self.state.write().chain.push_block(block);
        self.channels
            .broadcasts
            .emit(ConsensusEvent::BlockProcessed { block_id, height });
        if let Some(round) = opened {
            self.channels
                .broadcasts
                .emit(ConsensusEvent::RoundStarted { round });
        }
        Ok(opened)
    }

    /// Applies a verified block. Runs in the balances sequence.
    fn apply_block(&self, block: &Block) -> ConsensusResult<Option<u64>> {
        let tag = self.tag_of(block);
        let mut progress = Progress::default();
        match self.apply_steps(block, tag, &mut progress) {
            Ok(opened) => {
                if progress.rewound_pool {
                    let ids = block.transactions.iter().map(|transaction| transaction.id).collect();
                    self.channels.pool.remove_transactions(ids);
                    self.reapply_pool();
                }
                Ok(opened)
            }
            Err(err) => {
                debug!("unwinding block {}: {}", block.id, err);
                self.unwind(block, tag, &progress)?;
                Err(err)
            }
        }
    }

    fn apply_steps(
        &self,
        block: &Block,
        tag: BlockTag,
        progress: &mut Progress,
    ) -> ConsensusResult<Option<u64>> {
        let genesis = tag.genesis;
        if !block.transactions.is_empty() && !genesis {
            self.channels.pool.undo_unconfirmed_list()?;
            progress.rewound_pool = true;
        }
        for transaction in &block.transactions {
            self.apply_unconfirmed(transaction, genesis)
                .map_err(|err| block_transaction_error(block, transaction.id, err))?;
            progress.unconfirmed += 1;
        }
        for transaction in &block.transactions {
            self.engine
                .apply(transaction, tag)
                .map_err(|err| block_transaction_error(block, transaction.id, err))?;
            progress.confirmed += 1;
        }

        let storage = self.storage.clone();
        let stored = block.clone();
        self.storage_sequence
            .add_and_wait(move || storage.save_block(&stored))??;
        progress.persisted = true;

        let ticked = self.state.write().rounds.tick(block);
        Ok(ticked?)
    }

    fn apply_unconfirmed(&self, transaction: &Transaction, genesis: bool) -> Result<(), TransactionError> {
        if !genesis {
            self.engine.verify(transaction)?;
            if !self.engine.ready(transaction)? {
                return Err(TransactionError::InvalidCosignatures(format!(
                    "transaction {} lacks co-signatures",
                    transaction.id
                )));
            }
        }
        self.engine.apply_unconfirmed(transaction, genesis)
    }

    /// Reverts the steps of a failed application, in reverse order
    fn unwind(&self, block: &Block, tag: BlockTag, progress: &Progress) -> ConsensusResult<()> {
        let inconsistency = |err: &dyn std::fmt::Display| {
            error!("could not unwind block {}: {}", block.id, err);
            ConsensusError::ContainerInconsistency(format!("unwinding block {}: {}", block.id, err))
        };
        if progress.persisted {
            self.delete_stored(&block.id)
                .map_err(|err| inconsistency(&err))?;
        }
        for transaction in block.transactions[..progress.confirmed].iter().rev() {
            self.engine
                .undo(transaction, tag)
                .map_err(|err| inconsistency(&err))?;
        }
        for transaction in block.transactions[..progress.unconfirmed].iter().rev() {
            self.engine
                .undo_unconfirmed(transaction)
                .map_err(|err| inconsistency(&err))?;
        }
        if progress.rewound_pool {
            self.reapply_pool();
        }
        Ok(())
    }

    fn delete_stored(&self, block_id: &BlockId) -> ConsensusResult<()> {
        let storage = self.storage.clone();
        let block_id = *block_id;
        self.storage_sequence
            .add_and_wait(move || storage.delete_block(&block_id))??;
        Ok(())
    }

    fn reapply_pool(&self) {
        match self.channels.pool.apply_unconfirmed_list() {
            Ok(dropped) if !dropped.is_empty() => {
                debug!("{} pool transactions no longer apply", dropped.len())
            }
            Ok(_) => {}
            Err(err) => error!("could not re-apply the unconfirmed list: {}", err),
        }
    }

    /// Removes the tip and returns its transactions to the pool.
    ///
    /// Runs in the balances sequence. A failure after the first change leaves the
    /// containers inconsistent and is reported as fatal.
    pub(crate) fn pop_last_block(&self) -> ConsensusResult<Block> {
        let worker = self.clone();
        self.balances.add_and_wait(move || worker.remove_last_block())?
    }

    fn remove_last_block(&self) -> ConsensusResult<Block> {
        let last = self.last_block();
        if last.height <= 1 {
            return Err(ConsensusError::CannotRemoveGenesis);
        }
        let previous = self.parent_of(&last)?;
        let tag = self.tag_of(&last);
        self.channels.pool.undo_unconfirmed_list()?;

        let reverted = self.revert_block(&last, tag).map_err(|err| {
            error!("could not remove block {}: {}", last.id, err);
            ConsensusError::ContainerInconsistency(format!("removing block {}: {}", last.id, err))
        })?;

        self.state.write().chain.pop_block(previous);
        let returned = self
            .channels
            .pool
            .return_transactions(last.transactions.clone());
        self.reapply_pool();

        info!(
            "block {} removed from height {}, {} transactions returned to the pool",
            last.id, last.height, returned
        );
        self.channels.broadcasts.emit(ConsensusEvent::BlockRemoved {
            block_id: last.id,
            height: last.height,
        });
        if let Some(round) = reverted {
            self.channels
                .broadcasts
                .emit(ConsensusEvent::RoundReverted { round });
        }
        Ok(last)
    }

    fn revert_block(&self, block: &Block, tag: BlockTag) -> ConsensusResult<Option<u64>> {
        // rounds read the block back from storage, so they go first
        let reverted = self.state.write().rounds.backward_tick(block)?;
        for transaction in block.transactions.iter().rev() {
            self.engine.undo(transaction, tag)?;
            self.engine.undo_unconfirmed(transaction)?;
        }
        self.delete_stored(&block.id)?;
        Ok(reverted)
    }

    fn parent_of(&self, block: &Block) -> ConsensusResult<Block> {
        let parent_id = block
            .previous_block
            .ok_or(ConsensusError::CannotRemoveGenesis)?;
        let cached = self
            .state
            .read()
            .chain
            .get_at(block.height - 1)
            .filter(|cached| cached.id == parent_id)
            .cloned();
        match cached {
            Some(parent) => Ok(parent),
            None => self.storage.get_block(&parent_id)?.ok_or_else(|| {
                ConsensusError::ContainerInconsistency(format!("parent {} not stored", parent_id))
            }),
        }
    }
}
