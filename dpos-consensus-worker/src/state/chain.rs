// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_consensus_exports::types::BlockSource;
use dpos_models::{Block, BlockId};
use std::collections::{BTreeMap, HashMap};

/// Position of a received block relative to the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    /// same block already in the chain or among the orphans
    Present,
    /// below the cached window
    Stale,
    /// same height and parent as a chain block
    Orphaned {
        /// the chain block has the same forger
        double_forge: bool,
    },
    /// built on another chain, kept as orphan
    Forked,
    /// more than one height ahead
    NotReady,
    /// child of the last block
    Next,
}

/// Recent blocks of the chain plus the blocks kept on the side: orphans competing for a
/// height and blocks received ahead of their parent.
///
/// The cache holds at most `cache_size` heights. The last cached height is the chain tip.
pub(crate) struct ChainState {
    cache_size: usize,
    blocks: BTreeMap<u32, Block>,
    orphans: HashMap<BlockId, Block>,
    stashed: BTreeMap<u32, Vec<(Block, BlockSource)>>,
}

impl ChainState {
    pub fn new(cache_size: usize) -> Self {
        ChainState {
            cache_size: cache_size.max(2),
            blocks: BTreeMap::new(),
            orphans: HashMap::new(),
            stashed: BTreeMap::new(),
        }
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.values().next_back()
    }

    /// Height of the tip, 0 for an empty chain
    pub fn height(&self) -> u32 {
        self.last_block().map_or(0, |block| block.height)
    }

    pub fn get_at(&self, height: u32) -> Option<&Block> {
        self.blocks.get(&height)
    }

    pub fn classify(&self, block: &Block) -> Classification {
        let Some(last) = self.last_block() else {
            return if block.height == 1 {
                Classification::Next
            } else {
                Classification::NotReady
            };
        };
        let known = self.blocks.get(&block.height);
        if known.map_or(false, |known| known.id == block.id) {
            return Classification::Present;
        }
        // a forked block kept as orphan becomes the next block once its parent is the tip
        if block.height == last.height.saturating_add(1) && block.previous_block == Some(last.id) {
            return Classification::Next;
        }
        if self.orphans.contains_key(&block.id) {
            return Classification::Present;
        }
        if block.height > last.height.saturating_add(1) {
            return Classification::NotReady;
        }
        if block.height == last.height.saturating_add(1) {
            return Classification::Forked;
        }
        match known {
            None => Classification::Stale,
            Some(known) if known.previous_block == block.previous_block => {
                Classification::Orphaned {
                    double_forge: known.generator_public_key == block.generator_public_key,
                }
            }
            Some(_) => Classification::Forked,
        }
    }

    /// Makes `block` the new tip and drops what fell out of the window
    pub fn push_block(&mut self, block: Block) {
        let height = block.height;
        self.orphans.remove(&block.id);
        self.blocks.insert(height, block);
        let floor = height.saturating_sub(self.cache_size as u32);
        self.blocks = self.blocks.split_off(&floor.saturating_add(1));
        self.orphans.retain(|_, orphan| orphan.height > floor);
        self.stashed = self.stashed.split_off(&height.saturating_add(1));
    }

    /// Removes the tip. `previous` becomes the tip when the cache did not hold it.
    pub fn pop_block(&mut self, previous: Block) -> Option<Block> {
        let last_height = *self.blocks.keys().next_back()?;
        let removed = self.blocks.remove(&last_height);
        self.blocks.entry(previous.height).or_insert(previous);
        removed
    }

    pub fn add_orphan(&mut self, block: Block) {
        self.orphans.insert(block.id, block);
    }

    pub fn take_orphan(&mut self, block_id: &BlockId) -> Option<Block> {
        self.orphans.remove(block_id)
    }

    /// Whether `orphan` wins the fork choice against the tip: same parent, earlier
    /// timestamp, ties broken by the lower id
    pub fn should_swap(&self, orphan: &Block) -> bool {
        let Some(last) = self.last_block() else {
            return false;
        };
        orphan.height == last.height
            && orphan.id != last.id
            && orphan.previous_block == last.previous_block
            && (orphan.timestamp < last.timestamp
                || (orphan.timestamp == last.timestamp && orphan.id < last.id))
    }

    /// Keeps a block received ahead of its parent. Returns false when it is too far ahead.
    pub fn stash(&mut self, block: Block, source: BlockSource) -> bool {
        if block.height > self.height().saturating_add(self.cache_size as u32) {
            return false;
        }
        let waiting = self.stashed.entry(block.height).or_default();
        if waiting.iter().any(|(stashed, _)| stashed.id == block.id) {
            return true;
        }
        waiting.push((block, source));
        true
    }

    pub fn take_stashed(&mut self, height: u32) -> Vec<(Block, BlockSource)> {
        self.stashed.remove(&height).unwrap_or_default()
    }

    /// Ids of the cached blocks, newest first
    pub fn recent_ids(&self, count: usize) -> Vec<BlockId> {
        self.blocks.values().rev().take(count).map(|block| block.id).collect()
    }

    pub fn cached_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn orphans(&self) -> usize {
        self.orphans.len()
    }

    pub fn stashed(&self) -> usize {
        self.stashed.values().map(Vec::len).sum()
    }
}
