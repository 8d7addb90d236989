// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::ConsensusWorker;
use crate::state::Classification;
use dpos_consensus_exports::error::{ConsensusError, ConsensusResult};
use dpos_consensus_exports::types::BlockSource;
use dpos_protocol_exports::{PeerId, PeerRpc, ProtocolError, ProtocolResult};
use dpos_time::DposTime;
use tracing::{debug, info, warn};

impl ConsensusWorker {
    /// Queues a synchronization with `peer` unless one is already pending
    pub(crate) fn schedule_sync(&self, peer: PeerId) {
        {
            let mut state = self.state.write();
            if state.sync_pending {
                return;
            }
            state.sync_pending = true;
        }
        let worker = self.clone();
        let queued = self.blocks.add(move || {
            worker.state.write().sync_pending = false;
            if let Err(err) = worker.sync(&peer) {
                debug!("synchronization with {} failed: {}", peer, err);
            }
        });
        if let Err(err) = queued {
            self.state.write().sync_pending = false;
            debug!("could not queue synchronization: {}", err);
        }
    }

    /// Calls `peer` and records the outcome in the peer set
    fn call<T>(
        &self,
        peer: &PeerId,
        request: impl FnOnce(&dyn PeerRpc) -> ProtocolResult<T>,
    ) -> ConsensusResult<T> {
        match request(self.channels.peer_rpc.as_ref()) {
            Ok(value) => {
                self.channels.peer_set.record_success(peer);
                Ok(value)
            }
            Err(err) => {
                if err.kind().bans_peer() {
                    self.channels
                        .peer_set
                        .record_offense(peer, DposTime::now().unwrap_or(DposTime::from_millis(0)));
                } else {
                    self.channels.peer_set.record_failure(peer);
                }
                Err(err.into())
            }
        }
    }

    fn invalid_response(&self, peer: &PeerId, reason: String) -> ConsensusError {
        let err = ProtocolError::InvalidResponse(peer.to_string(), reason);
        self.channels
            .peer_set
            .record_offense(peer, DposTime::now().unwrap_or(DposTime::from_millis(0)));
        err.into()
    }

    /// Joins the chain of `peer` when it is ahead. Runs in the blocks sequence.
    ///
    /// # Returns
    /// The number of blocks applied
    pub(crate) fn sync(&self, peer: &PeerId) -> ConsensusResult<usize> {
        if let Some(reason) = &self.state.read().halted {
            return Err(ConsensusError::Halted(reason.clone()));
        }
        let now = DposTime::now().unwrap_or(DposTime::from_millis(0));
        if self.channels.peer_set.is_banned(peer, now) {
            return Err(ProtocolError::Banned(peer.to_string()).into());
        }
        let peer_height = self.call(peer, |rpc| rpc.get_height(peer))?;
        let local_height = self.height();
        if peer_height <= local_height {
            debug!("peer {} at height {}, nothing to sync", peer, peer_height);
            return Ok(0);
        }

        let ids = self.state.read().chain.recent_ids(self.config.block_cache_size);
        let common = self
            .call(peer, |rpc| rpc.get_common_block(peer, ids.clone()))?
            .ok_or_else(|| ConsensusError::NoCommonBlock(peer.to_string()))?;
        if !ids.contains(&common.id) {
            return Err(self.invalid_response(
                peer,
                format!("common block {} was not proposed", common.id),
            ));
        }
        let rewind = local_height.saturating_sub(common.height);
        if rewind > self.config.max_rewind {
            return Err(ConsensusError::NoCommonBlock(peer.to_string()));
        }
        if rewind > 0 {
            info!(
                "rewinding {} blocks to common block {} with {}",
                rewind, common.id, peer
            );
        }
        while self.height() > common.height {
            if let Err(err) = self.pop_last_block() {
                self.on_failure(&err, None);
                return Err(err);
            }
        }

        let mut applied = 0;
        while self.height() < peer_height {
            let height = self.height();
            let batch = self.call(peer, |rpc| {
                rpc.get_blocks_after(peer, height, self.config.sync_batch_size)
            })?;
            if batch.is_empty() {
                break;
            }
            for block in batch {
                let classification = self.state.read().chain.classify(&block);
                if classification != Classification::Next {
                    return Err(self.invalid_response(
                        peer,
                        format!("block {} does not extend height {}", block.id, self.height()),
                    ));
                }
                self.accept(block, &BlockSource::Peer(peer.clone()))?;
                applied += 1;
            }
        }
        if applied > 0 {
            info!("{} blocks applied from {}", applied, peer);
        } else if self.height() < peer_height {
            warn!("peer {} announced height {} but sent no block", peer, peer_height);
        }
        Ok(applied)
    }
}
