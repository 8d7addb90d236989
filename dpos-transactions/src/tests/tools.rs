// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{TransactionConfig, TransactionEngine, TransactionRequest};
use dpos_ledger::{Ledger, LedgerController};
use dpos_models::{AccountDelta, Address, Amount, BlockId, BlockTag, Transaction};
use dpos_signature::KeyPair;
use dpos_storage::MemoryStorage;

pub struct TestContext {
    pub engine: TransactionEngine,
    pub ledger: Ledger,
    pub storage: MemoryStorage,
}

pub fn context() -> TestContext {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(Box::new(storage.clone()));
    let engine = TransactionEngine::new(
        TransactionConfig::default(),
        Box::new(ledger.clone()),
        Box::new(storage.clone()),
    );
    TestContext {
        engine,
        ledger,
        storage,
    }
}

pub fn keypair(passphrase: &str) -> KeyPair {
    KeyPair::from_passphrase(passphrase).unwrap()
}

pub fn address(context: &TestContext, keypair: &KeyPair) -> Address {
    Address::from_public_key(
        &keypair.get_public_key(),
        context.engine.config().address_version,
    )
}

/// Credits both balances of the account of `keypair`
pub fn fund(context: &TestContext, keypair: &KeyPair, raw: i64) -> Address {
    let address = address(context, keypair);
    context
        .ledger
        .merge(&address, &AccountDelta::balances(raw))
        .unwrap();
    address
}

pub fn coins(units: u64) -> Amount {
    Amount::from_raw(units * 100_000_000)
}

pub fn tag(id: u64) -> BlockTag {
    BlockTag {
        block_id: BlockId::new(id),
        round: 1,
        genesis: false,
    }
}

pub fn transfer(
    context: &TestContext,
    sender: &KeyPair,
    recipient: &KeyPair,
    amount: Amount,
) -> Transaction {
    let request = TransactionRequest::transfer(address(context, recipient), amount, 0);
    context.engine.create(&request, sender, None).unwrap()
}

/// Applies on both tiers, like a block carrying a pooled transaction
pub fn confirm(context: &TestContext, transaction: &Transaction, block: u64) {
    context.engine.apply_unconfirmed(transaction, false).unwrap();
    context.engine.apply(transaction, tag(block)).unwrap();
}
