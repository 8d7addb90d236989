// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::ConsensusWorker;
use crate::state::Classification;
use dpos_consensus_exports::error::{ConsensusError, ConsensusResult};
use dpos_consensus_exports::events::ConsensusEvent;
use dpos_consensus_exports::types::{BlockOutcome, BlockSource, ForkCause};
use dpos_models::{Block, ErrorKind};
use dpos_protocol_exports::{BroadcastMessage, PeerId};
use dpos_time::DposTime;
use tracing::{debug, error, info, warn};

impl ConsensusWorker {
    /// Entry point of a block, forged or received. Runs in the blocks sequence.
    pub(crate) fn receive(&self, block: Block, source: BlockSource) -> ConsensusResult<BlockOutcome> {
        if let Some(reason) = &self.state.read().halted {
            return Err(ConsensusError::Halted(reason.clone()));
        }
        self.channels.broadcasts.emit(ConsensusEvent::BlockReceived {
            block_id: block.id,
            height: block.height,
            source: source.clone(),
        });

        let classification = self.state.read().chain.classify(&block);
        match classification {
            Classification::Present | Classification::Stale => {
                debug!("block {} at height {} ignored", block.id, block.height);
                Ok(BlockOutcome::Ignored)
            }
            Classification::NotReady => {
                let stashed = self.state.write().chain.stash(block.clone(), source.clone());
                if let Some(peer) = source.peer() {
                    self.schedule_sync(peer.clone());
                }
                if stashed {
                    debug!("block {} at height {} stashed", block.id, block.height);
                    Ok(BlockOutcome::Stashed)
                } else {
                    Ok(BlockOutcome::Ignored)
                }
            }
            Classification::Forked => {
                let cause = if block.height == self.height() + 1 {
                    ForkCause::PreviousMismatch
                } else {
                    ForkCause::ForkedChain
                };
                info!(
                    "fork {:?} with block {} at height {}",
                    cause, block.id, block.height
                );
                let block_id = block.id;
                self.state.write().chain.add_orphan(block);
                self.channels.broadcasts.emit(ConsensusEvent::Fork {
                    block_id: Some(block_id),
                    cause,
                });
                if let Some(peer) = source.peer() {
                    self.schedule_sync(peer.clone());
                }
                Ok(BlockOutcome::Forked)
            }
            Classification::Orphaned { double_forge } => {
                if double_forge {
                    warn!(
                        "delegate {} forged two blocks at height {}",
                        block.generator_public_key, block.height
                    );
                    self.channels.broadcasts.emit(ConsensusEvent::Fork {
                        block_id: Some(block.id),
                        cause: ForkCause::DoubleForging,
                    });
                }
                let swap = {
                    let mut state = self.state.write();
                    state.chain.add_orphan(block.clone());
                    state.chain.should_swap(&block)
                };
                if swap {
                    self.swap(block, &source)
                } else {
                    Ok(BlockOutcome::Orphaned)
                }
            }
            Classification::Next => {
                self.accept(block, &source)?;
                self.process_stashed();
                Ok(BlockOutcome::Applied)
            }
        }
    }

    /// Runs a block through the pipeline and reacts to the outcome: relay on success,
    /// ban or halt on failure
    pub(crate) fn accept(&self, block: Block, source: &BlockSource) -> ConsensusResult<()> {
        let relayed = self.config.broadcast_blocks.then(|| block.clone());
        let (block_id, height) = (block.id, block.height);
        match self.process_block(block, !source.is_forged()) {
            Ok(_) => {
                if let Some(peer) = source.peer() {
                    self.channels.peer_set.record_success(peer);
                }
                if source.is_forged() {
                    self.channels
                        .broadcasts
                        .emit(ConsensusEvent::BlockForged { block_id, height });
                }
                if let Some(block) = relayed {
                    self.relay(block);
                }
                Ok(())
            }
            Err(err) => {
                self.on_failure(&err, source.peer());
                Err(err)
            }
        }
    }

    fn relay(&self, block: Block) {
        match self
            .channels
            .peer_rpc
            .broadcast(BroadcastMessage::Block(Box::new(block)), self.config.broadcast_fanout)
        {
            Ok(sent) => debug!("block relayed to {} peers", sent),
            Err(err) => debug!("could not relay block: {}", err),
        }
    }

    /// Bans the peer behind a malformed or unverifiable block, stops the pipeline on a
    /// fatal error
    pub(crate) fn on_failure(&self, err: &ConsensusError, peer: Option<&PeerId>) {
        if err.kind() == ErrorKind::Fatal {
            error!("block pipeline halted: {}", err);
            self.state.write().halted = Some(err.to_string());
            return;
        }
        match peer {
            Some(peer) if err.kind().bans_peer() => {
                let now = DposTime::now().unwrap_or(DposTime::from_millis(0));
                let until = self.channels.peer_set.record_offense(peer, now);
                warn!("peer {} banned until {}: {}", peer, until, err);
            }
            _ => debug!("block rejected: {}", err),
        }
    }

    /// Replaces the tip by the orphan that wins the fork choice. The tip comes back
    /// if the orphan turns out invalid.
    fn swap(&self, orphan: Block, source: &BlockSource) -> ConsensusResult<BlockOutcome> {
        let removed = match self.pop_last_block() {
            Ok(removed) => removed,
            Err(err) => {
                self.on_failure(&err, None);
                return Err(err);
            }
        };
        info!(
            "block {} replaces block {} at height {}",
            orphan.id, removed.id, removed.height
        );
        self.channels.broadcasts.emit(ConsensusEvent::Fork {
            block_id: Some(orphan.id),
            cause: ForkCause::EarlierBlock,
        });
        self.state.write().chain.take_orphan(&orphan.id);
        match self.accept(orphan, source) {
            Ok(()) => {
                self.state.write().chain.add_orphan(removed);
                Ok(BlockOutcome::Swapped)
            }
            Err(err) => {
                warn!("restoring block {} after failed swap: {}", removed.id, err);
                if let Err(restore_err) = self.process_block(removed, false) {
                    self.on_failure(&restore_err, None);
                }
                Err(err)
            }
        }
    }

    /// Applies the stashed blocks that now extend the tip
    fn process_stashed(&self) {
        loop {
            let (last_id, next_height) = {
                let state = self.state.read();
                match state.chain.last_block() {
                    Some(last) => (last.id, last.height + 1),
                    None => return,
                }
            };
            let candidates = self.state.write().chain.take_stashed(next_height);
            if candidates.is_empty() {
                return;
            }
            let mut extended = false;
            for (block, source) in candidates {
                if block.previous_block != Some(last_id) {
                    continue;
                }
                match self.accept(block, &source) {
                    Ok(()) => {
                        extended = true;
                        break;
                    }
                    Err(err) => debug!("stashed block rejected: {}", err),
                }
            }
            if !extended {
                return;
            }
        }
    }
}
