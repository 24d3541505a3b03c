// Path: crates/storage/src/redb_store.rs

//! A [`Storage`] implementation backed by `redb`, an embedded pure-Rust KV
//! engine, grounded in the teacher's `RedbEpochStore` (one `TableDefinition`
//! per logical column family, errors mapped to `IoError::Backend`).

use alephium_api::storage::{ColumnFamily, Storage, StorageBatch};
use alephium_types::error::IoError;
use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;

const HEADERS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("HEADERS");
const BLOCKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("BLOCKS");
const TXS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("TXS");
const HEIGHTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("HEIGHTS");
const CANONICAL: TableDefinition<&[u8], &[u8]> = TableDefinition::new("CANONICAL");
const TRIE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("TRIE");
const META: TableDefinition<&[u8], &[u8]> = TableDefinition::new("META");

fn table_for(cf: ColumnFamily) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
    match cf {
        ColumnFamily::Headers => HEADERS,
        ColumnFamily::Blocks => BLOCKS,
        ColumnFamily::Txs => TXS,
        ColumnFamily::Heights => HEIGHTS,
        ColumnFamily::Canonical => CANONICAL,
        ColumnFamily::Trie => TRIE,
        ColumnFamily::Meta => META,
    }
}

/// A `redb`-backed `Storage`. Every column family lives in its own table
/// within a single on-disk database file.
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    /// Opens (creating if absent) a `redb` database at `path`, ensuring
    /// every column-family table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let db = Database::create(path).map_err(|e| IoError::Backend(e.to_string()))?;
        {
            let write_txn = db.begin_write().map_err(|e| IoError::Backend(e.to_string()))?;
            for cf in [
                ColumnFamily::Headers,
                ColumnFamily::Blocks,
                ColumnFamily::Txs,
                ColumnFamily::Heights,
                ColumnFamily::Canonical,
                ColumnFamily::Trie,
                ColumnFamily::Meta,
            ] {
                write_txn
                    .open_table(table_for(cf))
                    .map_err(|e| IoError::Backend(e.to_string()))?;
            }
            write_txn.commit().map_err(|e| IoError::Backend(e.to_string()))?;
        }
        Ok(RedbStorage { db })
    }

    /// Opens a database backed by a fresh temp file under the OS temp
    /// directory. Used by tests (in this crate and downstream ones) that
    /// don't want to manage a path themselves; the returned guard must be
    /// kept alive for as long as the storage is in use.
    pub fn open_temp() -> Result<(Self, tempfile::TempPath), IoError> {
        let file = tempfile::NamedTempFile::new().map_err(|e| IoError::Backend(e.to_string()))?;
        let path = file.into_temp_path();
        let storage = Self::open(&path)?;
        Ok((storage, path))
    }
}

#[async_trait]
impl Storage for RedbStorage {
    async fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, IoError> {
        let read_txn = self.db.begin_read().map_err(|e| IoError::Backend(e.to_string()))?;
        let table = read_txn
            .open_table(table_for(cf))
            .map_err(|e| IoError::Backend(e.to_string()))?;
        let value = table.get(key).map_err(|e| IoError::Backend(e.to_string()))?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    async fn commit(&self, batch: StorageBatch) -> Result<(), IoError> {
        let write_txn = self.db.begin_write().map_err(|e| IoError::Backend(e.to_string()))?;
        {
            for (cf, key, value) in batch.puts() {
                let mut table = write_txn
                    .open_table(table_for(*cf))
                    .map_err(|e| IoError::Backend(e.to_string()))?;
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(|e| IoError::CommitFailed(e.to_string()))?;
            }
            for (cf, key) in batch.deletes() {
                let mut table = write_txn
                    .open_table(table_for(*cf))
                    .map_err(|e| IoError::Backend(e.to_string()))?;
                table
                    .remove(key.as_slice())
                    .map_err(|e| IoError::CommitFailed(e.to_string()))?;
            }
        }
        write_txn.commit().map_err(|e| IoError::CommitFailed(e.to_string()))?;
        Ok(())
    }

    async fn scan_prefix(
        &self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, IoError> {
        let read_txn = self.db.begin_read().map_err(|e| IoError::Backend(e.to_string()))?;
        let table = read_txn
            .open_table(table_for(cf))
            .map_err(|e| IoError::Backend(e.to_string()))?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(|e| IoError::Backend(e.to_string()))? {
            let (k, v) = entry.map_err(|e| IoError::Backend(e.to_string()))?;
            if k.value().starts_with(prefix) {
                out.push((k.value().to_vec(), v.value().to_vec()));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (storage, _guard) = RedbStorage::open_temp().unwrap();
        let mut batch = StorageBatch::new();
        batch.put(ColumnFamily::Headers, b"h1".to_vec(), b"header-bytes".to_vec());
        storage.commit(batch).await.unwrap();
        let value = storage.get(ColumnFamily::Headers, b"h1").await.unwrap();
        assert_eq!(value, Some(b"header-bytes".to_vec()));
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let (storage, _guard) = RedbStorage::open_temp().unwrap();
        assert_eq!(storage.get(ColumnFamily::Blocks, b"nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let (storage, _guard) = RedbStorage::open_temp().unwrap();
        let mut batch = StorageBatch::new();
        batch.put(ColumnFamily::Meta, b"k".to_vec(), b"v".to_vec());
        storage.commit(batch).await.unwrap();
        let mut batch = StorageBatch::new();
        batch.delete(ColumnFamily::Meta, b"k".to_vec());
        storage.commit(batch).await.unwrap();
        assert_eq!(storage.get(ColumnFamily::Meta, b"k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_prefix_finds_matching_keys_only() {
        let (storage, _guard) = RedbStorage::open_temp().unwrap();
        let mut batch = StorageBatch::new();
        batch.put(ColumnFamily::Heights, b"h/0/00".to_vec(), b"a".to_vec());
        batch.put(ColumnFamily::Heights, b"h/0/01".to_vec(), b"b".to_vec());
        batch.put(ColumnFamily::Heights, b"h/1/00".to_vec(), b"c".to_vec());
        storage.commit(batch).await.unwrap();
        let found = storage.scan_prefix(ColumnFamily::Heights, b"h/0/").await.unwrap();
        assert_eq!(found.len(), 2);
    }
}
