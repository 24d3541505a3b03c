// Path: crates/api/src/storage.rs

//! The `Storage` trait: a column-family key→value facade with staging
//! overlays, grounded in the teacher's state/chain trait shapes
//! (`async_trait`, `Result<_, TypedError>`, `Arc<dyn Trait>` handles).

use alephium_types::error::IoError;
use async_trait::async_trait;

/// The logical column families a `Storage` implementation must expose
/// (spec §6 "Persisted layout").
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ColumnFamily {
    /// Full blocks, keyed by block hash (only for chains the broker owns
    /// as "from").
    Blocks,
    /// Block headers, keyed by block hash.
    Headers,
    /// `TxId -> [(BlockHash, index)]`.
    Txs,
    /// `(ChainIndex, height) -> [Hash]`.
    Heights,
    /// `(ChainIndex, height) -> Hash`, the canonical-chain pointer.
    Canonical,
    /// Contract world-state Merkle-Patricia trie nodes.
    Trie,
    /// Tips, best-deps, broker info, and other small singleton records.
    Meta,
}

/// A batched set of writes applied atomically by [`Storage::commit`].
#[derive(Default, Debug)]
pub struct StorageBatch {
    puts: Vec<(ColumnFamily, Vec<u8>, Vec<u8>)>,
    deletes: Vec<(ColumnFamily, Vec<u8>)>,
}

impl StorageBatch {
    /// An empty batch.
    pub fn new() -> Self {
        StorageBatch::default()
    }

    /// Stages a `put`.
    pub fn put(&mut self, cf: ColumnFamily, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.puts.push((cf, key.into(), value.into()));
    }

    /// Stages a `delete`.
    pub fn delete(&mut self, cf: ColumnFamily, key: impl Into<Vec<u8>>) {
        self.deletes.push((cf, key.into()));
    }

    /// The staged puts, in insertion order.
    pub fn puts(&self) -> &[(ColumnFamily, Vec<u8>, Vec<u8>)] {
        &self.puts
    }

    /// The staged deletes, in insertion order.
    pub fn deletes(&self) -> &[(ColumnFamily, Vec<u8>)] {
        &self.deletes
    }

    /// `true` iff no writes have been staged.
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }
}

/// A column-family key→value store with atomic batch commit.
///
/// Implementations back this with an embedded KV engine (the teacher uses
/// `redb`). This crate only defines the seam; `alephium-storage` provides
/// the in-workspace implementation the other crates are built and tested
/// against.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads a single value, or `None` if absent.
    async fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, IoError>;

    /// Applies a batch of puts/deletes atomically.
    async fn commit(&self, batch: StorageBatch) -> Result<(), IoError>;

    /// Iterates all keys with the given prefix within a column family, in
    /// ascending key order. Used by height-indexed and prefix-scan
    /// lookups (e.g. `heightIndex`, `txIndex`).
    async fn scan_prefix(
        &self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, IoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_tracks_puts_and_deletes() {
        let mut batch = StorageBatch::new();
        assert!(batch.is_empty());
        batch.put(ColumnFamily::Headers, b"k".to_vec(), b"v".to_vec());
        batch.delete(ColumnFamily::Blocks, b"k2".to_vec());
        assert!(!batch.is_empty());
        assert_eq!(batch.puts().len(), 1);
        assert_eq!(batch.deletes().len(), 1);
    }
}
