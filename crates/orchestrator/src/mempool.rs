// Path: crates/orchestrator/src/mempool.rs

//! A bounded, TTL-evicting pool of pending transactions, one logical
//! partition per chain. Grounded in the teacher's `orchestration::mempool`
//! (per-account queues, capacity enforcement, rejection reasons), collapsed
//! here to per-tx admission since this kernel has no account/nonce model —
//! admission order within a chain is FIFO by arrival, not nonce-ordered.

use alephium_types::config::MempoolConfig;
use alephium_types::{ChainIndex, Transaction, TxId};
use std::collections::{HashMap, VecDeque};

/// The outcome of attempting to admit a transaction.
#[derive(Debug, PartialEq, Eq)]
pub enum AddResult {
    /// Admitted into the pending pool.
    Admitted,
    /// Already pending (re-gossiped); not an error, but not re-admitted.
    AlreadyPending,
    /// Rejected: the chain's pool is at capacity.
    Rejected(String),
}

struct Entry {
    tx: Transaction,
    admitted_at_millis: u64,
}

/// One FIFO queue of pending transactions per chain, each bounded to
/// `capacity_per_chain` and evicted after `tx_ttl_millis`.
pub struct Mempool {
    config: MempoolConfig,
    queues: HashMap<ChainIndex, VecDeque<TxId>>,
    entries: HashMap<TxId, Entry>,
}

impl Mempool {
    /// Builds an empty pool under `config`.
    pub fn new(config: MempoolConfig) -> Self {
        Mempool {
            config,
            queues: HashMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Attempts to admit `tx` into `chain_index`'s pending queue.
    pub fn add(&mut self, chain_index: ChainIndex, tx: Transaction, now_millis: u64) -> AddResult {
        let id = tx.id();
        if self.entries.contains_key(&id) {
            return AddResult::AlreadyPending;
        }
        let queue = self.queues.entry(chain_index).or_default();
        if queue.len() >= self.config.capacity_per_chain {
            return AddResult::Rejected("mempool at capacity".into());
        }
        queue.push_back(id);
        self.entries.insert(id, Entry { tx, admitted_at_millis: now_millis });
        AddResult::Admitted
    }

    /// Removes a transaction once it has been included in an admitted
    /// block, so it is not offered for inclusion again.
    pub fn remove(&mut self, chain_index: ChainIndex, id: &TxId) {
        self.entries.remove(id);
        if let Some(queue) = self.queues.get_mut(&chain_index) {
            queue.retain(|pending| pending != id);
        }
    }

    /// Evicts every transaction older than `tx_ttl_millis`.
    pub fn evict_expired(&mut self, now_millis: u64) {
        let ttl = self.config.tx_ttl_millis;
        let stale: Vec<TxId> = self
            .entries
            .iter()
            .filter(|(_, e)| now_millis.saturating_sub(e.admitted_at_millis) > ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            self.entries.remove(&id);
        }
        for queue in self.queues.values_mut() {
            queue.retain(|id| self.entries.contains_key(id));
        }
    }

    /// The currently pending transactions for a chain, oldest first.
    pub fn pending(&self, chain_index: ChainIndex) -> Vec<&Transaction> {
        self.queues
            .get(&chain_index)
            .map(|queue| queue.iter().filter_map(|id| self.entries.get(id)).map(|e| &e.tx).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::output::{AssetOutput, Amount, LockupScript, TxOutput};
    use alephium_types::transaction::UnsignedTransaction;
    use alephium_types::{GroupIndex, Hash};

    fn sample_tx(seed: &[u8]) -> Transaction {
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![],
                fixed_outputs: vec![TxOutput::Asset(AssetOutput {
                    amount: Amount::from_u64(1),
                    lockup_script: LockupScript::P2PKH(Hash::hash(seed)),
                    tokens: vec![],
                    lock_time: 0,
                    additional_data: vec![],
                })],
                gas_amount: 20_000,
                gas_price: Amount::from_u64(1),
                script: None,
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![],
            contract_signatures: vec![],
        }
    }

    fn index() -> ChainIndex {
        ChainIndex::new(GroupIndex::new(0, 2), GroupIndex::new(0, 2))
    }

    #[test]
    fn admits_new_tx_and_rejects_duplicate() {
        let mut pool = Mempool::new(MempoolConfig::default());
        let tx = sample_tx(b"a");
        assert_eq!(pool.add(index(), tx.clone(), 0), AddResult::Admitted);
        assert_eq!(pool.add(index(), tx, 0), AddResult::AlreadyPending);
    }

    #[test]
    fn rejects_over_capacity() {
        let mut config = MempoolConfig::default();
        config.capacity_per_chain = 1;
        let mut pool = Mempool::new(config);
        pool.add(index(), sample_tx(b"a"), 0);
        let result = pool.add(index(), sample_tx(b"b"), 0);
        assert!(matches!(result, AddResult::Rejected(_)));
    }

    #[test]
    fn evicts_expired_entries() {
        let mut config = MempoolConfig::default();
        config.tx_ttl_millis = 100;
        let mut pool = Mempool::new(config);
        pool.add(index(), sample_tx(b"a"), 0);
        pool.evict_expired(1000);
        assert!(pool.pending(index()).is_empty());
    }
}
