// Path: crates/state/src/pool.rs

//! `ContractPool`: an LRU cache of currently-loaded contract objects,
//! scoped to a single block application (spec §4.4 "Context", §9 "Cyclic
//! references": "a short-lived cache rebuilt per block").

use crate::contract::{ContractId, ContractState};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 256;

/// A bounded, per-block cache of loaded contract state, avoiding repeated
/// trie lookups when a contract is touched by multiple instructions or
/// multiple transactions within the same block.
pub struct ContractPool {
    cache: LruCache<ContractId, Arc<ContractState>>,
}

impl ContractPool {
    /// Creates an empty pool with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty pool bounded to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        ContractPool {
            cache: LruCache::new(cap),
        }
    }

    /// Returns the cached state for `id`, if present, promoting it to
    /// most-recently-used.
    pub fn get(&mut self, id: &ContractId) -> Option<Arc<ContractState>> {
        self.cache.get(id).cloned()
    }

    /// Inserts or replaces `id`'s cached state.
    pub fn put(&mut self, id: ContractId, state: Arc<ContractState>) {
        self.cache.put(id, state);
    }

    /// Removes `id` from the pool (used after `DestroySelf`).
    pub fn evict(&mut self, id: &ContractId) {
        self.cache.pop(id);
    }

    /// The number of contracts currently cached.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// `true` iff the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drops every cached entry, required at the end of each block
    /// application so the next block starts from a clean pool.
    pub fn drain(&mut self) {
        self.cache.clear();
    }
}

impl Default for ContractPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::hash::Hash;
    use alephium_types::transaction::TxOutputRef;

    fn sample_state() -> Arc<ContractState> {
        Arc::new(ContractState::new(
            Hash::hash(b"code"),
            vec![1, 2, 3],
            TxOutputRef::contract(0, Hash::hash(b"out")),
        ))
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut pool = ContractPool::new();
        let id = ContractId(Hash::hash(b"contract"));
        pool.put(id, sample_state());
        assert!(pool.get(&id).is_some());
    }

    #[test]
    fn evict_removes_entry() {
        let mut pool = ContractPool::new();
        let id = ContractId(Hash::hash(b"contract"));
        pool.put(id, sample_state());
        pool.evict(&id);
        assert!(pool.get(&id).is_none());
    }

    #[test]
    fn drain_clears_all_entries() {
        let mut pool = ContractPool::new();
        pool.put(ContractId(Hash::hash(b"a")), sample_state());
        pool.put(ContractId(Hash::hash(b"b")), sample_state());
        pool.drain();
        assert!(pool.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let mut pool = ContractPool::with_capacity(1);
        let a = ContractId(Hash::hash(b"a"));
        let b = ContractId(Hash::hash(b"b"));
        pool.put(a, sample_state());
        pool.put(b, sample_state());
        assert!(pool.get(&a).is_none());
        assert!(pool.get(&b).is_some());
    }
}
