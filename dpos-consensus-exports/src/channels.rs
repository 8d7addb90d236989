// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::events::ConsensusEvent;
use dpos_pool_exports::PoolController;
use dpos_protocol_exports::{PeerRpc, PeerSet};
use tokio::sync::broadcast;

/// Event bus of consensus, shared with the components that emit on it
#[derive(Clone)]
pub struct ConsensusBroadcasts {
    /// sender of the event bus
    pub event_sender: broadcast::Sender<ConsensusEvent>,
}

impl ConsensusBroadcasts {
    /// Event bus holding at most `capacity` unread events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (event_sender, _) = broadcast::channel(capacity);
        ConsensusBroadcasts { event_sender }
    }

    /// Publishes `event`. Having no subscriber is not an error.
    pub fn emit(&self, event: ConsensusEvent) {
        let _ = self.event_sender.send(event);
    }

    /// New subscription to the bus
    pub fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent> {
        self.event_sender.subscribe()
    }
}

/// Components consensus talks to
#[derive(Clone)]
pub struct ConsensusChannels {
    /// transaction pool
    pub pool: Box<dyn PoolController>,
    /// peer calls
    pub peer_rpc: Box<dyn PeerRpc>,
    /// peer health and bans
    pub peer_set: PeerSet,
    /// event bus
    pub broadcasts: ConsensusBroadcasts,
}
