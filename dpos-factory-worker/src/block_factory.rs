// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::state::ForgingState;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use dpos_consensus_exports::events::ConsensusEvent;
use dpos_consensus_exports::types::{BlockSource, ForkCause};
use dpos_factory_exports::{FactoryChannels, FactoryConfig, FactoryResult, ForgingOutcome};
use dpos_logging::dpos_trace;
use dpos_models::{Block, SlotClock};
use dpos_protocol_exports::PeerId;
use dpos_time::DposTime;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answers of the polled peers about their last block
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct QuorumPoll {
    /// peers that answered
    pub responsive: usize,
    /// answering peers at the local height
    pub height_matching: usize,
    /// peers at the local height agreeing on the last block, the slot and forging
    pub agreeing: usize,
    /// highest peer above the local height
    pub ahead: Option<(PeerId, u32)>,
}

/// Structure gathering all elements needed by the factory thread
pub(crate) struct BlockFactoryWorker {
    config: FactoryConfig,
    clock: SlotClock,
    state: Arc<RwLock<ForgingState>>,
    channels: FactoryChannels,
    factory_receiver: Receiver<()>,
}

impl BlockFactoryWorker {
    pub(crate) fn new(
        config: FactoryConfig,
        state: Arc<RwLock<ForgingState>>,
        channels: FactoryChannels,
        factory_receiver: Receiver<()>,
    ) -> Self {
        BlockFactoryWorker {
            clock: config.slot_clock(),
            config,
            state,
            channels,
            factory_receiver,
        }
    }

    /// Polls up to `max_polled_peers` healthy peers for their status at `slot`.
    ///
    /// A peer at the local height agrees when it has the same last block, is in the same
    /// slot and would allow forging.
    pub(crate) fn poll_quorum(&self, last: &Block, slot: u64, now: DposTime) -> QuorumPoll {
        let mut poll = QuorumPoll::default();
        for peer in self
            .channels
            .peer_set
            .select(self.config.max_polled_peers, now)
        {
            let status = match self.channels.peer_rpc.get_status(&peer) {
                Ok(status) => status,
                Err(err) => {
                    debug!("peer {} did not answer the quorum poll: {}", peer, err);
                    self.channels.peer_set.record_failure(&peer);
                    continue;
                }
            };
            self.channels.peer_set.record_success(&peer);
            poll.responsive += 1;
            let height = status.header.height;
            if height > last.height {
                if poll.ahead.as_ref().map_or(true, |(_, best)| height > *best) {
                    poll.ahead = Some((peer, height));
                }
            } else if height == last.height {
                poll.height_matching += 1;
                if status.header.id == last.id
                    && status.current_slot == slot
                    && status.forging_allowed
                {
                    poll.agreeing += 1;
                }
            }
        }
        poll
    }

    /// Forging attempt at wall-clock time `now`
    pub(crate) fn process_tick(&self, now: DposTime) -> FactoryResult<ForgingOutcome> {
        if !self.state.read().enabled {
            return Ok(ForgingOutcome::Disabled);
        }
        if !self.clock.is_forging_window(now) {
            return Ok(ForgingOutcome::OutsideWindow);
        }
        let slot = self.clock.slot_at(now);
        let delegate = self.channels.consensus.get_slot_delegate(slot)?;
        let Some(keypair) = self.state.read().forging_key(&delegate).cloned() else {
            return Ok(ForgingOutcome::NotOurSlot { slot });
        };
        let last = self.channels.consensus.get_last_block();
        if self.clock.slot_number(last.timestamp) >= slot {
            return Ok(ForgingOutcome::SlotTaken { slot });
        }

        let poll = self.poll_quorum(&last, slot, now);
        if let Some((peer, height)) = poll.ahead {
            info!(
                "peer {} is at height {} above {}, not forging slot {}",
                peer, height, last.height, slot
            );
            if let Err(err) = self.channels.consensus.sync_with_peer(peer.clone()) {
                debug!("synchronization with {} failed: {}", peer, err);
            }
            return Ok(ForgingOutcome::PeerAhead { peer, height });
        }
        if poll.height_matching == 0 {
            if !self.config.allow_forging_without_peers {
                debug!(
                    "none of {} answering peers is at height {}, not forging slot {}",
                    poll.responsive, last.height, slot
                );
                return Ok(ForgingOutcome::NoPeers);
            }
        } else if (poll.agreeing as f64) < self.config.min_quorum * poll.height_matching as f64 {
            warn!(
                "only {} of {} peers at height {} agree with block {}, not forging slot {}",
                poll.agreeing, poll.height_matching, last.height, last.id, slot
            );
            self.channels.broadcasts.emit(ConsensusEvent::Fork {
                block_id: Some(last.id),
                cause: ForkCause::QuorumNotReached,
            });
            return Ok(ForgingOutcome::QuorumNotReached {
                agreeing: poll.agreeing,
                height_matching: poll.height_matching,
            });
        }

        match self.channels.pool.fill_pool() {
            Ok(promoted) if promoted > 0 => debug!("{} transactions promoted before forging", promoted),
            Ok(_) => {}
            Err(err) => warn!("pool fill failed before forging: {}", err),
        }
        let transactions = self
            .channels
            .pool
            .get_block_transactions(self.config.max_transactions_per_block);
        let height = last.height + 1;
        let block = Block::new_signed(
            &keypair,
            self.config.block_version,
            self.clock.slot_time(slot),
            Some((last.id, last.height)),
            transactions,
            self.config.milestones.calc_reward(height),
        )?;
        let block_id = block.id;
        let count = block.transactions.len();
        let outcome = self
            .channels
            .consensus
            .receive_block(block, BlockSource::Forged)?;
        info!(
            "block {} forged at slot {} by {} with {} transactions: {:?}",
            block_id, slot, delegate, count, outcome
        );
        dpos_trace!("factory.block_forged", {
            "block_id": block_id.to_string(),
            "height": height,
            "slot": slot
        });
        Ok(ForgingOutcome::Forged { block_id, height })
    }

    fn tick(&self) {
        let now = match DposTime::now() {
            Ok(now) => now,
            Err(err) => {
                warn!("block factory could not read the clock: {}", err);
                return;
            }
        };
        match self.process_tick(now) {
            Ok(outcome) => self.state.write().last_outcome = Some(outcome),
            Err(err) => warn!("forging failed: {}", err),
        }
    }

    /// Interruptibly wait for the next tick or a stop signal
    ///
    /// # Return value
    /// Returns `true` if the tick was reached, otherwise `false` if there was an interruption.
    fn interruptible_wait(&self) -> bool {
        match self
            .factory_receiver
            .recv_timeout(self.config.tick_interval.to_duration())
        {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
            Err(RecvTimeoutError::Timeout) => true,
        }
    }

    /// main run loop of the block factory thread
    pub(crate) fn run(self) {
        while self.interruptible_wait() {
            self.tick();
        }
        debug!("block factory worker exiting");
    }
}
