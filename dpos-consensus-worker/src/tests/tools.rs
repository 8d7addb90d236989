// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{start_consensus_controller, SharedSequences};
use dpos_consensus_exports::{
    ConsensusBroadcasts, ConsensusChannels, ConsensusConfig, ConsensusController,
    ConsensusManager, GenesisConfig,
};
use dpos_ledger::{Ledger, LedgerController};
use dpos_models::{Account, Address, Amount, Block, Transaction};
use dpos_pool_exports::{PoolConfig, PoolController, PoolManager};
use dpos_pool_worker::start_pool_controller;
use dpos_protocol_exports::{OfflinePeerRpc, PeerRpc, PeerSet, ProtocolConfig};
use dpos_rounds::RoundsConfig;
use dpos_sequence::{start_sequence, SequenceConfig, SequenceManager};
use dpos_signature::KeyPair;
use dpos_storage::MemoryStorage;
use dpos_time::DposTime;
use dpos_transactions::{TransactionConfig, TransactionEngine, TransactionRequest};

pub const DELEGATES: usize = 3;

/// A node without transport: storage, ledger, pool and consensus over three delegates
pub struct ConsensusTest {
    pub controller: Box<dyn ConsensusController>,
    pub pool: Box<dyn PoolController>,
    pub storage: MemoryStorage,
    pub ledger: Ledger,
    pub engine: TransactionEngine,
    pub peer_set: PeerSet,
    pub config: ConsensusConfig,
    pub delegates: Vec<KeyPair>,
    pub holder: KeyPair,
    consensus_manager: Box<dyn ConsensusManager>,
    pool_manager: Box<dyn PoolManager>,
    sequence_managers: Vec<SequenceManager>,
}

impl Drop for ConsensusTest {
    fn drop(&mut self) {
        self.consensus_manager.stop();
        self.pool_manager.stop();
        for manager in self.sequence_managers.iter_mut() {
            manager.stop();
        }
    }
}

pub fn keypair(passphrase: &str) -> KeyPair {
    KeyPair::from_passphrase(passphrase).unwrap()
}

pub fn coins(units: u64) -> Amount {
    Amount::from_raw(units * 100_000_000)
}

pub fn consensus_config() -> ConsensusConfig {
    ConsensusConfig {
        genesis: GenesisConfig {
            delegate_passphrases: (0..DELEGATES)
                .map(|index| format!("delegate {}", index))
                .collect(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn consensus_test(peer_rpc: Box<dyn PeerRpc>) -> ConsensusTest {
    let config = consensus_config();
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(Box::new(storage.clone()));
    let engine = TransactionEngine::new(
        TransactionConfig::default(),
        Box::new(ledger.clone()),
        Box::new(storage.clone()),
    );
    let (balances, balances_manager) =
        start_sequence(SequenceConfig::new("balances", 1_000)).unwrap();
    let (storage_sequence, storage_manager) =
        start_sequence(SequenceConfig::new("storage", 1_000)).unwrap();
    let pool_config = PoolConfig {
        bundle_interval: DposTime::from_secs(3_600),
        expiry_interval: DposTime::from_secs(3_600),
        ..Default::default()
    };
    let (pool_manager, pool) =
        start_pool_controller(pool_config, engine.clone(), balances.clone()).unwrap();
    let peer_set = PeerSet::new(&ProtocolConfig::default());
    let channels = ConsensusChannels {
        pool: pool.clone(),
        peer_rpc,
        peer_set: peer_set.clone(),
        broadcasts: ConsensusBroadcasts::new(config.event_channel_size),
    };
    let (consensus_manager, controller) = start_consensus_controller(
        config.clone(),
        RoundsConfig {
            delegates: DELEGATES,
            ..Default::default()
        },
        channels,
        engine.clone(),
        Box::new(ledger.clone()),
        Box::new(storage.clone()),
        SharedSequences {
            balances,
            storage: storage_sequence,
        },
    )
    .unwrap();
    ConsensusTest {
        controller,
        pool,
        storage,
        ledger,
        engine,
        peer_set,
        delegates: config
            .genesis
            .delegate_passphrases
            .iter()
            .map(|passphrase| keypair(passphrase))
            .collect(),
        holder: keypair(&config.genesis.holder_passphrase),
        config,
        consensus_manager,
        pool_manager,
        sequence_managers: vec![storage_manager, balances_manager],
    }
}

pub fn offline_test() -> ConsensusTest {
    consensus_test(Box::new(OfflinePeerRpc))
}

impl ConsensusTest {
    pub fn address(&self, keypair: &KeyPair) -> Address {
        Address::from_public_key(
            &keypair.get_public_key(),
            self.engine.config().address_version,
        )
    }

    pub fn account(&self, keypair: &KeyPair) -> Option<Account> {
        self.ledger.get_account(&self.address(keypair)).unwrap()
    }

    /// Delegate assigned to the slot of `timestamp` for the next block
    pub fn forger_of(&self, timestamp: u32) -> &KeyPair {
        let slot = self.config.slot_clock().slot_number(timestamp);
        let expected = self.controller.get_slot_delegate(slot).unwrap();
        self.delegates
            .iter()
            .find(|delegate| delegate.get_public_key() == expected)
            .unwrap()
    }

    /// Block on top of `previous`, signed by the delegate of its slot
    pub fn forge(&self, previous: &Block, timestamp: u32, transactions: Vec<Transaction>) -> Block {
        self.forge_with(self.forger_of(timestamp), previous, timestamp, transactions)
    }

    pub fn forge_with(
        &self,
        forger: &KeyPair,
        previous: &Block,
        timestamp: u32,
        transactions: Vec<Transaction>,
    ) -> Block {
        Block::new_signed(
            forger,
            self.config.block_version,
            timestamp,
            Some((previous.id, previous.height)),
            transactions,
            self.config.milestones.calc_reward(previous.height + 1),
        )
        .unwrap()
    }

    /// Transfer of `units` coins from the genesis holder
    pub fn payment(&self, recipient: &KeyPair, units: u64) -> Transaction {
        let request = TransactionRequest::transfer(self.address(recipient), coins(units), 0);
        self.engine.create(&request, &self.holder, None).unwrap()
    }
}
