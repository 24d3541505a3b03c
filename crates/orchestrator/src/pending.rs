// Path: crates/orchestrator/src/pending.rs

//! Parking for blocks rejected with `InvalidBlockError::MissingDeps`: rather
//! than discard a block whose declared dependency isn't known yet, park it
//! keyed by that missing hash and re-offer it once the dependency arrives.
//! Grounded in the teacher's `orchestration::sync` pattern of tracking
//! in-flight/blocked work by the hash it is waiting on, adapted here to a
//! plain in-memory multimap since this crate has no separate sync-progress
//! tracker.

use alephium_types::{Block, Hash};
use std::collections::HashMap;

/// Blocks parked on a dependency this node hasn't seen yet.
pub struct PendingPool {
    waiting_on: HashMap<Hash, Vec<Block>>,
}

impl PendingPool {
    /// Builds an empty pool.
    pub fn new() -> Self {
        PendingPool { waiting_on: HashMap::new() }
    }

    /// Parks `block`, to be re-offered once `missing_dep` is admitted.
    pub fn park(&mut self, missing_dep: Hash, block: Block) {
        self.waiting_on.entry(missing_dep).or_default().push(block);
    }

    /// Removes and returns every block that was waiting on `dep_hash`, now
    /// that it has been admitted.
    pub fn take_ready(&mut self, dep_hash: &Hash) -> Vec<Block> {
        self.waiting_on.remove(dep_hash).unwrap_or_default()
    }

    /// The number of blocks currently parked, across all dependencies.
    pub fn len(&self) -> usize {
        self.waiting_on.values().map(|v| v.len()).sum()
    }

    /// `true` iff no blocks are parked.
    pub fn is_empty(&self) -> bool {
        self.waiting_on.is_empty()
    }
}

impl Default for PendingPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::header::{BlockHeader, Target};
    use num_bigint::BigUint;

    fn dummy_block(seed: &[u8]) -> Block {
        let header = BlockHeader::genesis(2, Hash::hash(seed), Target::from_biguint(&BigUint::from(1u32)));
        Block::new(header, vec![])
    }

    #[test]
    fn parks_and_releases_by_dependency() {
        let mut pool = PendingPool::new();
        let dep = Hash::hash(b"dep");
        assert!(pool.is_empty());
        pool.park(dep, dummy_block(b"a"));
        pool.park(dep, dummy_block(b"b"));
        assert_eq!(pool.len(), 2);
        let ready = pool.take_ready(&dep);
        assert_eq!(ready.len(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn take_ready_on_unknown_dep_is_empty() {
        let mut pool = PendingPool::new();
        assert!(pool.take_ready(&Hash::hash(b"nope")).is_empty());
    }
}
