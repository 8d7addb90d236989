// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::ProtocolConfig;
use crate::peer_id::PeerId;
use dpos_time::DposTime;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_HEALTH: i32 = 100;
const MIN_HEALTH: i32 = -100;
const FAILURE_PENALTY: i32 = 10;
/// offenses beyond this one no longer lengthen the ban
const MAX_BAN_EXPONENT: u32 = 16;

/// What the node knows about one peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerInfo {
    /// grows with answered calls, drops with failed ones
    pub health: i32,
    /// invalid data received from this peer
    pub offenses: u32,
    /// end of the current ban
    pub banned_until: Option<DposTime>,
}

impl PeerInfo {
    /// Whether the peer is banned at `now`
    pub fn is_banned(&self, now: DposTime) -> bool {
        self.banned_until.map_or(false, |until| now < until)
    }
}

/// Known peers with health scores and bans. Clones share the same table.
#[derive(Clone)]
pub struct PeerSet {
    ban_duration: DposTime,
    peers: Arc<RwLock<BTreeMap<PeerId, PeerInfo>>>,
}

impl PeerSet {
    /// Peer set seeded with the configured peers
    pub fn new(config: &ProtocolConfig) -> Self {
        PeerSet {
            ban_duration: config.ban_duration,
            peers: Arc::new(RwLock::new(
                config
                    .peers
                    .iter()
                    .map(|peer| (peer.clone(), PeerInfo::default()))
                    .collect(),
            )),
        }
    }

    /// Registers a peer, keeping its record if already known
    pub fn add_peer(&self, peer: PeerId) {
        self.peers.write().entry(peer).or_default();
    }

    /// Record of `peer`
    pub fn get(&self, peer: &PeerId) -> Option<PeerInfo> {
        self.peers.read().get(peer).cloned()
    }

    /// Number of known peers, banned ones included
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Whether no peer is known
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Whether `peer` is banned at `now`
    pub fn is_banned(&self, peer: &PeerId, now: DposTime) -> bool {
        self.peers
            .read()
            .get(peer)
            .map_or(false, |info| info.is_banned(now))
    }

    /// Up to `limit` peers not banned at `now`, healthiest first
    pub fn select(&self, limit: usize, now: DposTime) -> Vec<PeerId> {
        let peers = self.peers.read();
        let mut candidates: Vec<(&PeerId, &PeerInfo)> = peers
            .iter()
            .filter(|(_, info)| !info.is_banned(now))
            .collect();
        candidates.sort_by(|(a_id, a), (b_id, b)| b.health.cmp(&a.health).then(a_id.cmp(b_id)));
        candidates
            .into_iter()
            .take(limit)
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    /// The peer answered a call
    pub fn record_success(&self, peer: &PeerId) {
        let mut peers = self.peers.write();
        let info = peers.entry(peer.clone()).or_default();
        info.health = (info.health + 1).min(MAX_HEALTH);
    }

    /// The peer failed a call (timeout, unreachable)
    pub fn record_failure(&self, peer: &PeerId) {
        let mut peers = self.peers.write();
        let info = peers.entry(peer.clone()).or_default();
        info.health = (info.health - FAILURE_PENALTY).max(MIN_HEALTH);
        debug!("peer {} failed a call, health {}", peer, info.health);
    }

    /// The peer sent malformed or unverifiable data: bans it for the base duration doubled
    /// for each previous offense. Returns the end of the ban.
    pub fn record_offense(&self, peer: &PeerId, now: DposTime) -> DposTime {
        let mut peers = self.peers.write();
        let info = peers.entry(peer.clone()).or_default();
        let exponent = info.offenses.min(MAX_BAN_EXPONENT);
        info.offenses = info.offenses.saturating_add(1);
        let until = now.saturating_add(self.ban_duration.saturating_mul(1u64 << exponent));
        info.banned_until = Some(until);
        warn!(
            "peer {} banned until {} after {} offenses",
            peer, until, info.offenses
        );
        until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer_set(names: &[&str]) -> PeerSet {
        PeerSet::new(&ProtocolConfig {
            peers: names.iter().map(|name| PeerId::new(*name)).collect(),
            ban_duration: DposTime::from_secs(10),
            ..ProtocolConfig::default()
        })
    }

    #[test]
    fn test_select_prefers_healthy_peers() {
        let peers = peer_set(&["a", "b", "c"]);
        let now = DposTime::from_secs(1_000);
        peers.record_success(&PeerId::new("c"));
        peers.record_failure(&PeerId::new("a"));

        assert_eq!(
            peers.select(3, now),
            vec![PeerId::new("c"), PeerId::new("b"), PeerId::new("a")]
        );
        assert_eq!(peers.select(1, now), vec![PeerId::new("c")]);
    }

    #[test]
    fn test_ban_doubles_with_offenses() {
        let peers = peer_set(&["a", "b"]);
        let offender = PeerId::new("a");
        let now = DposTime::from_secs(1_000);

        let first = peers.record_offense(&offender, now);
        assert_eq!(first, DposTime::from_secs(1_010));
        assert!(peers.is_banned(&offender, now));
        assert_eq!(peers.select(5, now), vec![PeerId::new("b")]);
        assert!(!peers.is_banned(&offender, first));

        let second = peers.record_offense(&offender, first);
        assert_eq!(second, DposTime::from_secs(1_030));
        assert_eq!(peers.get(&offender).unwrap().offenses, 2);
    }

    #[test]
    fn test_health_is_bounded() {
        let peers = peer_set(&[]);
        let peer = PeerId::new("flaky");
        for _ in 0..50 {
            peers.record_failure(&peer);
        }
        assert_eq!(peers.get(&peer).unwrap().health, MIN_HEALTH);
        assert_eq!(peers.len(), 1);
    }
}
