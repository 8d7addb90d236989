// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_consensus_exports::ConsensusManager;
use dpos_sequence::{Sequence, SequenceManager};
use tracing::info;

pub struct ConsensusManagerImpl {
    pub(crate) blocks: Sequence,
    pub(crate) blocks_manager: Option<SequenceManager>,
}

impl ConsensusManager for ConsensusManagerImpl {
    /// Skips the queued blocks and syncs, lets the running one finish, then joins the
    /// blocks sequence
    fn stop(&mut self) {
        info!("stopping consensus worker...");
        if let Some(mut blocks_manager) = self.blocks_manager.take() {
            self.blocks.cancel();
            blocks_manager.stop();
        }
        info!("consensus worker stopped");
    }
}
