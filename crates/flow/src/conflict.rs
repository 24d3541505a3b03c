// Path: crates/flow/src/conflict.rs

//! The conflict cache (§4.3): a bounded, time-windowed index from spent
//! `TxOutputRef`s to the blocks that spend them, used to reject a block
//! that double-spends an input already consumed by a recent sibling block
//! on another chain.

use alephium_types::{BlockHash, Transaction, TxOutputRef};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Tracks, for a rolling `keepDuration` window, which blocks spend which
/// outputs, and which pairs of blocks are therefore mutually conflicting.
pub struct ConflictCache {
    keep_duration: Duration,
    spenders: HashMap<TxOutputRef, HashSet<BlockHash>>,
    conflicts: HashMap<BlockHash, HashSet<BlockHash>>,
    timestamps: HashMap<BlockHash, u64>,
}

impl ConflictCache {
    /// Builds an empty cache with the given retention window. A
    /// `keep_duration` of zero makes every operation a no-op, per the
    /// config's documented behavior.
    pub fn new(keep_duration: Duration) -> Self {
        ConflictCache {
            keep_duration,
            spenders: HashMap::new(),
            conflicts: HashMap::new(),
            timestamps: HashMap::new(),
        }
    }

    /// Indexes every input of every non-coinbase transaction in `block`,
    /// linking it against any other cached block that already spends the
    /// same output.
    pub fn add(&mut self, block_hash: BlockHash, timestamp: u64, non_coinbase: &[Transaction]) {
        if self.keep_duration.is_zero() {
            return;
        }
        self.timestamps.insert(block_hash, timestamp);
        for tx in non_coinbase {
            for input in &tx.unsigned.inputs {
                let spenders = self.spenders.entry(input.output_ref.clone()).or_default();
                for other in spenders.iter() {
                    if *other != block_hash {
                        self.conflicts.entry(block_hash).or_default().insert(*other);
                        self.conflicts.entry(*other).or_default().insert(block_hash);
                    }
                }
                spenders.insert(block_hash);
            }
        }
    }

    /// Reverses `add`, e.g. after a block is discarded by a reorg.
    pub fn remove(&mut self, block_hash: &BlockHash, non_coinbase: &[Transaction]) {
        if self.keep_duration.is_zero() {
            return;
        }
        self.timestamps.remove(block_hash);
        if let Some(peers) = self.conflicts.remove(block_hash) {
            for peer in peers {
                if let Some(set) = self.conflicts.get_mut(&peer) {
                    set.remove(block_hash);
                }
            }
        }
        for tx in non_coinbase {
            for input in &tx.unsigned.inputs {
                if let Some(spenders) = self.spenders.get_mut(&input.output_ref) {
                    spenders.remove(block_hash);
                    if spenders.is_empty() {
                        self.spenders.remove(&input.output_ref);
                    }
                }
            }
        }
    }

    /// `true` iff any two of the given block hashes are recorded as
    /// mutually conflicting (i.e. both spend a common output).
    pub fn is_conflicted(&self, hashes: &[BlockHash]) -> bool {
        if self.keep_duration.is_zero() {
            return false;
        }
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                if self.conflicts.get(a).map(|s| s.contains(b)).unwrap_or(false) {
                    return true;
                }
            }
        }
        false
    }

    /// Prospective check for a not-yet-added block: `true` iff any input
    /// spent in `non_coinbase` is already spent by some cached sibling
    /// block (one on another chain, within the retention window).
    pub fn conflicts_with_any_cached(&self, non_coinbase: &[Transaction]) -> Option<BlockHash> {
        if self.keep_duration.is_zero() {
            return None;
        }
        for tx in non_coinbase {
            for input in &tx.unsigned.inputs {
                if let Some(spenders) = self.spenders.get(&input.output_ref) {
                    if let Some(existing) = spenders.iter().next() {
                        return Some(*existing);
                    }
                }
            }
        }
        None
    }

    /// Drops every entry older than `keep_duration` relative to `now`.
    pub fn evict_older_than(&mut self, now_millis: u64) {
        if self.keep_duration.is_zero() {
            return;
        }
        let cutoff = now_millis.saturating_sub(self.keep_duration.as_millis() as u64);
        let stale: Vec<BlockHash> = self
            .timestamps
            .iter()
            .filter(|(_, &ts)| ts < cutoff)
            .map(|(h, _)| *h)
            .collect();
        for hash in stale {
            self.timestamps.remove(&hash);
            if let Some(peers) = self.conflicts.remove(&hash) {
                for peer in peers {
                    if let Some(set) = self.conflicts.get_mut(&peer) {
                        set.remove(&hash);
                    }
                }
            }
            self.spenders.retain(|_, spenders| {
                spenders.remove(&hash);
                !spenders.is_empty()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::output::{AssetOutput, Amount, LockupScript, TxOutput, UnlockScript};
    use alephium_types::transaction::TxInput;
    use alephium_types::{Hash, UnsignedTransaction};

    fn tx_spending(output_refs: Vec<TxOutputRef>) -> Transaction {
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: output_refs
                    .into_iter()
                    .map(|output_ref| TxInput { output_ref, unlock_script: UnlockScript::P2PKH(vec![]) })
                    .collect(),
                fixed_outputs: vec![TxOutput::Asset(AssetOutput {
                    amount: Amount::from_u64(1),
                    lockup_script: LockupScript::P2PKH(Hash::hash(b"dest")),
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

    #[test]
    fn blocks_sharing_an_input_are_conflicted() {
        let mut cache = ConflictCache::new(Duration::from_secs(3600));
        let shared = TxOutputRef::asset(0, Hash::hash(b"utxo"));
        let a = BlockHash::new(Hash::hash(b"a"));
        let b = BlockHash::new(Hash::hash(b"b"));
        cache.add(a, 1000, &[tx_spending(vec![shared.clone()])]);
        cache.add(b, 1000, &[tx_spending(vec![shared])]);
        assert!(cache.is_conflicted(&[a, b]));
    }

    #[test]
    fn disjoint_blocks_do_not_conflict() {
        let mut cache = ConflictCache::new(Duration::from_secs(3600));
        let a = BlockHash::new(Hash::hash(b"a"));
        let b = BlockHash::new(Hash::hash(b"b"));
        cache.add(a, 1000, &[tx_spending(vec![TxOutputRef::asset(0, Hash::hash(b"u1"))])]);
        cache.add(b, 1000, &[tx_spending(vec![TxOutputRef::asset(0, Hash::hash(b"u2"))])]);
        assert!(!cache.is_conflicted(&[a, b]));
    }

    #[test]
    fn remove_clears_conflict_links() {
        let mut cache = ConflictCache::new(Duration::from_secs(3600));
        let shared = TxOutputRef::asset(0, Hash::hash(b"utxo"));
        let a = BlockHash::new(Hash::hash(b"a"));
        let b = BlockHash::new(Hash::hash(b"b"));
        let tx_a = tx_spending(vec![shared.clone()]);
        let tx_b = tx_spending(vec![shared]);
        cache.add(a, 1000, &[tx_a.clone()]);
        cache.add(b, 1000, &[tx_b.clone()]);
        cache.remove(&a, &[tx_a]);
        assert!(!cache.is_conflicted(&[a, b]));
    }

    #[test]
    fn zero_keep_duration_is_a_no_op() {
        let mut cache = ConflictCache::new(Duration::ZERO);
        let shared = TxOutputRef::asset(0, Hash::hash(b"utxo"));
        let a = BlockHash::new(Hash::hash(b"a"));
        let b = BlockHash::new(Hash::hash(b"b"));
        cache.add(a, 1000, &[tx_spending(vec![shared.clone()])]);
        cache.add(b, 1000, &[tx_spending(vec![shared])]);
        assert!(!cache.is_conflicted(&[a, b]));
    }

    #[test]
    fn eviction_drops_stale_entries() {
        let mut cache = ConflictCache::new(Duration::from_millis(100));
        let shared = TxOutputRef::asset(0, Hash::hash(b"utxo"));
        let a = BlockHash::new(Hash::hash(b"a"));
        let b = BlockHash::new(Hash::hash(b"b"));
        cache.add(a, 1000, &[tx_spending(vec![shared.clone()])]);
        cache.add(b, 1000, &[tx_spending(vec![shared])]);
        cache.evict_older_than(2000);
        assert!(!cache.is_conflicted(&[a, b]));
    }
}
