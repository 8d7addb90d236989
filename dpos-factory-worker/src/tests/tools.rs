// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::block_factory::BlockFactoryWorker;
use crate::controller::FactoryControllerImpl;
use crate::state::ForgingState;
use crossbeam_channel::Sender;
use dpos_consensus_exports::{ConsensusBroadcasts, MockConsensusController};
use dpos_factory_exports::{FactoryChannels, FactoryConfig};
use dpos_models::{Amount, Block};
use dpos_pool_exports::MockPoolController;
use dpos_protocol_exports::{
    MockPeerRpc, PeerId, PeerSet, PeerStatus, ProtocolConfig, ProtocolError,
};
use dpos_signature::KeyPair;
use dpos_time::DposTime;
use parking_lot::RwLock;
use std::sync::Arc;

pub const BLOCK_TIME: u32 = 8;
/// slot of the ticks the scenarios run, seconds 16 to 23 after the epoch
pub const CURRENT_SLOT: u64 = 2;

pub fn delegate(index: usize) -> KeyPair {
    KeyPair::from_passphrase(&format!("delegate {}", index)).unwrap()
}

/// Wall-clock time `secs` seconds after the test epoch
pub fn at(secs: u64) -> DposTime {
    DposTime::from_secs(secs)
}

pub fn factory_config() -> FactoryConfig {
    FactoryConfig {
        delegate_passphrases: vec!["delegate 0".into(), "delegate 1".into()],
        epoch: DposTime::from_millis(0),
        block_time: BLOCK_TIME,
        ..Default::default()
    }
}

/// Block at height 1 forged by `forger` at epoch time `timestamp`
pub fn chain_tip(forger: &KeyPair, timestamp: u32) -> Block {
    Block::new_signed(forger, 0, timestamp, None, Vec::new(), Amount::zero()).unwrap()
}

/// Block on top of `previous`
pub fn child_of(forger: &KeyPair, previous: &Block, timestamp: u32) -> Block {
    Block::new_signed(
        forger,
        0,
        timestamp,
        Some((previous.id, previous.height)),
        Vec::new(),
        Amount::zero(),
    )
    .unwrap()
}

/// Status of a peer whose chain ends with `last`
pub fn status(last: &Block, current_slot: u64, forging_allowed: bool) -> PeerStatus {
    PeerStatus {
        header: last.header(),
        current_slot,
        forging_allowed,
    }
}

/// Mocks to set expectations on before building the worker
pub struct FactoryTest {
    pub config: FactoryConfig,
    pub consensus: MockConsensusController,
    pub pool: MockPoolController,
    pub peer_rpc: MockPeerRpc,
    pub peer_set: PeerSet,
    pub broadcasts: ConsensusBroadcasts,
}

/// Worker built over the mocks, driven by explicit `process_tick` calls
pub struct TestFactory {
    pub worker: BlockFactoryWorker,
    pub controller: FactoryControllerImpl,
    pub peer_set: PeerSet,
    pub broadcasts: ConsensusBroadcasts,
    _factory_sender: Sender<()>,
}

impl FactoryTest {
    pub fn new(peers: &[&str]) -> Self {
        FactoryTest {
            config: factory_config(),
            consensus: MockConsensusController::new(),
            pool: MockPoolController::new(),
            peer_rpc: MockPeerRpc::new(),
            peer_set: PeerSet::new(&ProtocolConfig {
                peers: peers.iter().map(|name| PeerId::new(*name)).collect(),
                ..Default::default()
            }),
            broadcasts: ConsensusBroadcasts::new(16),
        }
    }

    /// The chain ends with `last` and the current slot belongs to `forger`
    pub fn with_chain(mut self, last: &Block, forger: &KeyPair) -> Self {
        let public_key = forger.get_public_key();
        self.consensus
            .expect_get_slot_delegate()
            .returning(move |_| Ok(public_key));
        self.consensus
            .expect_get_last_block()
            .return_const(last.clone());
        self
    }

    /// Listed peers answer with the header of their block, in slot `CURRENT_SLOT` and
    /// allowing forging. The others time out.
    pub fn answering(self, answers: Vec<(&str, Block)>) -> Self {
        self.answering_status(
            answers
                .into_iter()
                .map(|(name, block)| (name, status(&block, CURRENT_SLOT, true)))
                .collect(),
        )
    }

    /// Listed peers answer with their status, the others time out
    pub fn answering_status(mut self, answers: Vec<(&str, PeerStatus)>) -> Self {
        let answers: Vec<(PeerId, PeerStatus)> = answers
            .into_iter()
            .map(|(name, status)| (PeerId::new(name), status))
            .collect();
        self.peer_rpc.expect_get_status().returning(move |peer| {
            answers
                .iter()
                .find(|(known, _)| known == peer)
                .map(|(_, status)| status.clone())
                .ok_or_else(|| ProtocolError::Timeout(peer.to_string()))
        });
        self
    }

    pub fn build(self) -> TestFactory {
        let state = Arc::new(RwLock::new(
            ForgingState::from_passphrases(
                &self.config.delegate_passphrases,
                self.config.forging_enabled,
            )
            .unwrap(),
        ));
        let (factory_sender, factory_receiver) = crossbeam_channel::bounded(0);
        let worker = BlockFactoryWorker::new(
            self.config,
            state.clone(),
            FactoryChannels {
                consensus: Box::new(self.consensus),
                pool: Box::new(self.pool),
                peer_rpc: Box::new(self.peer_rpc),
                peer_set: self.peer_set.clone(),
                broadcasts: self.broadcasts.clone(),
            },
            factory_receiver,
        );
        TestFactory {
            worker,
            controller: FactoryControllerImpl { state },
            peer_set: self.peer_set,
            broadcasts: self.broadcasts,
            _factory_sender: factory_sender,
        }
    }
}
