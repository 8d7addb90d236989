// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::controller_traits::StorageController;
use crate::error::{StorageError, StorageResult};
use dpos_models::{
    Account, Address, Block, BlockId, RoundSnapshot, TransactionDeserializer, TransactionId,
};
use dpos_serialization::{DeserializeError, Deserializer};
use dpos_signature::{PublicKey, Signature};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Block row: header plus the raw bytes of each transaction, in block order.
/// Co-signatures are not part of the bytes and are kept next to them.
struct StoredBlock {
    header: Block,
    raw_transactions: Vec<Vec<u8>>,
    cosignatures: Vec<Vec<Signature>>,
}

#[derive(Default)]
struct MemoryStorageState {
    accounts: BTreeMap<Address, Account>,
    public_keys: HashMap<PublicKey, Address>,
    blocks: HashMap<BlockId, StoredBlock>,
    heights: BTreeMap<u32, BlockId>,
    transactions: HashMap<TransactionId, BlockId>,
    rounds: BTreeMap<u64, RoundSnapshot>,
}

/// In-memory implementation of `StorageController`.
/// Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryStorageState>>,
    transaction_deserializer: TransactionDeserializer,
}

impl MemoryStorage {
    /// Empty storage
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_block(&self, stored: &StoredBlock) -> StorageResult<Block> {
        let mut block = stored.header.clone();
        block.transactions = stored
            .raw_transactions
            .iter()
            .zip(stored.cosignatures.iter())
            .map(|(raw, cosignatures)| {
                let (rest, mut transaction) = self
                    .transaction_deserializer
                    .deserialize::<DeserializeError>(raw)
                    .map_err(|err| StorageError::DeserializeError(err.to_string()))?;
                if !rest.is_empty() {
                    return Err(StorageError::DeserializeError(format!(
                        "{} trailing bytes after transaction",
                        rest.len()
                    )));
                }
                transaction.signatures = cosignatures.clone();
                Ok(transaction)
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(block)
    }
}

impl StorageController for MemoryStorage {
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>> {
        Ok(self.state.read().accounts.get(address).cloned())
    }

    fn get_account_by_public_key(
        &self,
        public_key: &PublicKey,
    ) -> StorageResult<Option<Account>> {
        let state = self.state.read();
        Ok(state
            .public_keys
            .get(public_key)
            .and_then(|address| state.accounts.get(address))
            .cloned())
    }

    fn get_account_by_username(&self, username: &str) -> StorageResult<Option<Account>> {
        let state = self.state.read();
        let confirmed = state
            .accounts
            .values()
            .find(|account| account.username.as_deref() == Some(username));
        Ok(confirmed
            .or_else(|| {
                state
                    .accounts
                    .values()
                    .find(|account| account.u_username.as_deref() == Some(username))
            })
            .cloned())
    }

    fn get_accounts(&self) -> StorageResult<Vec<Account>> {
        Ok(self.state.read().accounts.values().cloned().collect())
    }

    fn save_account(&self, account: Account) -> StorageResult<()> {
        let mut state = self.state.write();
        if let Some(public_key) = account.public_key {
            state.public_keys.insert(public_key, account.address);
        }
        state.accounts.insert(account.address, account);
        Ok(())
    }

    fn save_block(&self, block: &Block) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.blocks.contains_key(&block.id) {
            return Err(StorageError::BlockAlreadyStored(block.id.to_string()));
        }
        if state.heights.contains_key(&block.height) {
            return Err(StorageError::HeightOccupied(block.height));
        }
        if let Some(transaction) = block
            .transactions
            .iter()
            .find(|transaction| state.transactions.contains_key(&transaction.id))
        {
            return Err(StorageError::TransactionAlreadyStored(
                transaction.id.to_string(),
            ));
        }
        for transaction in &block.transactions {
            state.transactions.insert(transaction.id, block.id);
        }
        state.heights.insert(block.height, block.id);
        state.blocks.insert(
            block.id,
            StoredBlock {
                header: block.header(),
                raw_transactions: block
                    .transactions
                    .iter()
                    .map(|transaction| transaction.to_bytes(true, true))
                    .collect(),
                cosignatures: block
                    .transactions
                    .iter()
                    .map(|transaction| transaction.signatures.clone())
                    .collect(),
            },
        );
        debug!("stored block {} at height {}", block.id, block.height);
        Ok(())
    }

    fn delete_block(&self, block_id: &BlockId) -> StorageResult<()> {
        let mut state = self.state.write();
        let height = match state.blocks.get(block_id) {
            Some(stored) => stored.header.height,
            None => return Err(StorageError::NotFound(format!("block {}", block_id))),
        };
        if state.heights.keys().next_back() != Some(&height) {
            return Err(StorageError::NotLastBlock(block_id.to_string()));
        }
        state.heights.remove(&height);
        state.blocks.remove(block_id);
        state.transactions.retain(|_, owner| owner != block_id);
        debug!("deleted block {} at height {}", block_id, height);
        Ok(())
    }

    fn get_block(&self, block_id: &BlockId) -> StorageResult<Option<Block>> {
        let state = self.state.read();
        state
            .blocks
            .get(block_id)
            .map(|stored| self.decode_block(stored))
            .transpose()
    }

    fn get_block_at_height(&self, height: u32) -> StorageResult<Option<Block>> {
        let state = self.state.read();
        state
            .heights
            .get(&height)
            .and_then(|id| state.blocks.get(id))
            .map(|stored| self.decode_block(stored))
            .transpose()
    }

    fn get_last_block(&self) -> StorageResult<Option<Block>> {
        let state = self.state.read();
        state
            .heights
            .values()
            .next_back()
            .and_then(|id| state.blocks.get(id))
            .map(|stored| self.decode_block(stored))
            .transpose()
    }

    fn get_blocks_after(&self, height: u32, limit: usize) -> StorageResult<Vec<Block>> {
        let state = self.state.read();
        state
            .heights
            .range(height.saturating_add(1)..)
            .take(limit)
            .filter_map(|(_, id)| state.blocks.get(id))
            .map(|stored| self.decode_block(stored))
            .collect()
    }

    fn block_exists(&self, block_id: &BlockId) -> StorageResult<bool> {
        Ok(self.state.read().blocks.contains_key(block_id))
    }

    fn transaction_exists(&self, transaction_id: &TransactionId) -> StorageResult<bool> {
        Ok(self.state.read().transactions.contains_key(transaction_id))
    }

    fn save_round_snapshot(&self, snapshot: RoundSnapshot) -> StorageResult<()> {
        self.state.write().rounds.insert(snapshot.round, snapshot);
        Ok(())
    }

    fn get_round_snapshot(&self, round: u64) -> StorageResult<Option<RoundSnapshot>> {
        Ok(self.state.read().rounds.get(&round).cloned())
    }

    fn delete_round_snapshot(&self, round: u64) -> StorageResult<()> {
        self.state.write().rounds.remove(&round);
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn StorageController> {
        Box::new(self.clone())
    }
}
