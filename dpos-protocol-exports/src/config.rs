// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::peer_id::PeerId;
use dpos_models::config::constants::MAX_POLLED_PEERS;
use dpos_time::DposTime;
use serde::Deserialize;

/// Protocol configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolConfig {
    /// peers known at startup
    pub peers: Vec<PeerId>,
    /// peers asked for their status before forging
    pub max_polled_peers: usize,
    /// bound of one peer call
    pub peer_timeout: DposTime,
    /// ban of a first offense, doubled for each further one
    pub ban_duration: DposTime,
    /// peers a broadcast is sent to
    pub broadcast_fanout: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            peers: Vec::new(),
            max_polled_peers: MAX_POLLED_PEERS,
            peer_timeout: DposTime::from_millis(2_000),
            ban_duration: DposTime::from_secs(60),
            broadcast_fanout: 25,
        }
    }
}
