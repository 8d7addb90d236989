// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::controller_impl::PoolControllerImpl;
use crate::transaction_pool::TransactionPool;
use dpos_ledger::{Ledger, LedgerController};
use dpos_models::{Account, AccountDelta, Address, Amount, SetEntry, Transaction, TransactionAsset};
use dpos_pool_exports::PoolConfig;
use dpos_sequence::{start_sequence, SequenceConfig, SequenceManager};
use dpos_signature::KeyPair;
use dpos_storage::MemoryStorage;
use dpos_transactions::{TransactionConfig, TransactionEngine, TransactionRequest};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct PoolTest {
    pub controller: PoolControllerImpl,
    pub engine: TransactionEngine,
    pub ledger: Ledger,
    sequence_manager: SequenceManager,
}

impl Drop for PoolTest {
    fn drop(&mut self) {
        self.sequence_manager.stop();
    }
}

pub fn pool_test(config: PoolConfig) -> PoolTest {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(Box::new(storage.clone()));
    let engine = TransactionEngine::new(
        TransactionConfig::default(),
        Box::new(ledger.clone()),
        Box::new(storage),
    );
    let (balances, sequence_manager) =
        start_sequence(SequenceConfig::new("balances", 1_000)).unwrap();
    let controller = PoolControllerImpl {
        pool: Arc::new(RwLock::new(TransactionPool::new(config.clone()))),
        config,
        engine: engine.clone(),
        balances,
    };
    PoolTest {
        controller,
        engine,
        ledger,
        sequence_manager,
    }
}

pub fn keypair(passphrase: &str) -> KeyPair {
    KeyPair::from_passphrase(passphrase).unwrap()
}

pub fn coins(units: u64) -> Amount {
    Amount::from_raw(units * 100_000_000)
}

impl PoolTest {
    pub fn address(&self, keypair: &KeyPair) -> Address {
        Address::from_public_key(
            &keypair.get_public_key(),
            self.engine.config().address_version,
        )
    }

    /// Credits both balances of the account of `keypair`
    pub fn fund(&self, keypair: &KeyPair, amount: Amount) -> Address {
        let address = self.address(keypair);
        self.ledger
            .merge(&address, &AccountDelta::balances(amount.to_signed()))
            .unwrap();
        address
    }

    pub fn account(&self, address: &Address) -> Account {
        self.ledger.get_account(address).unwrap().unwrap()
    }

    /// Transfer of `units` coins; distinct amounts give distinct ids
    pub fn transfer(&self, sender: &KeyPair, recipient: &KeyPair, units: u64) -> Transaction {
        let request = TransactionRequest::transfer(self.address(recipient), coins(units), 0);
        self.engine.create(&request, sender, None).unwrap()
    }

    pub fn register_multisignature(
        &self,
        owner: &KeyPair,
        min: u8,
        members: &[KeyPair],
    ) -> Transaction {
        let asset = TransactionAsset::Multisignature {
            min,
            lifetime: 24,
            keysgroup: members
                .iter()
                .map(|member| SetEntry::add(member.get_public_key()))
                .collect(),
        };
        self.engine
            .create(&TransactionRequest::new(asset, 0), owner, None)
            .unwrap()
    }
}
