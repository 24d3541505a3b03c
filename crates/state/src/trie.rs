// Path: crates/state/src/trie.rs

//! The contract world-state: a Merkle-Patricia trie keyed by contract id,
//! mapping to `(codeHash, fields, outputRef)` (spec §3 "Lifecycles").
//!
//! Trie nodes are internal, non-consensus-critical records (the trie's
//! *root hash* is consensus-critical, but the on-disk node encoding is an
//! implementation detail), so unlike `alephium_types::codec` this module
//! uses `parity-scale-codec`'s `Encode`/`Decode` derives, matching the
//! teacher's internal storage encodings.

use alephium_api::storage::{ColumnFamily, Storage, StorageBatch};
use alephium_types::error::IoError;
use alephium_types::hash::Hash;
use parity_scale_codec::{Decode, Encode};
use std::collections::HashMap;
use std::sync::Arc;

/// One nibble (half-byte) of a trie key path.
type Nibble = u8;

fn bytes_to_nibbles(bytes: &[u8]) -> Vec<Nibble> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(b >> 4);
        out.push(b & 0x0f);
    }
    out
}

/// A node in the Merkle-Patricia trie. Child references are content
/// hashes, never back-pointers, so the structure is purely acyclic (spec
/// §9 "Cyclic references").
#[derive(Clone, Encode, Decode, Debug, PartialEq, Eq)]
enum Node {
    /// A terminal node holding the remaining key nibbles and the stored
    /// value.
    Leaf { remainder: Vec<Nibble>, value: Vec<u8> },
    /// A shared-prefix compression node pointing at a single child.
    Extension { remainder: Vec<Nibble>, child: [u8; 32] },
    /// A 16-way fan-out node, optionally terminal itself.
    Branch {
        children: Box<[Option<[u8; 32]>; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    fn hash(&self) -> Hash {
        Hash::hash(&self.encode())
    }
}

/// Errors reading or writing the trie.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    /// The underlying storage failed.
    #[error(transparent)]
    Io(#[from] IoError),
    /// A node's bytes did not decode as a well-formed [`Node`].
    #[error("corrupt trie node")]
    CorruptNode,
}

/// A persistent Merkle-Patricia trie over `Hash -> Vec<u8>`, backed by the
/// `Trie` column family. Keyed generically by `Hash` so both the contract
/// world-state and any other content-addressed mapping can reuse it.
pub struct Trie {
    storage: Arc<dyn Storage>,
}

impl Trie {
    /// Wraps a `Storage` handle.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Trie { storage }
    }

    async fn load_node(&self, hash: &Hash) -> Result<Option<Node>, TrieError> {
        let bytes = self.storage.get(ColumnFamily::Trie, hash.as_bytes()).await?;
        match bytes {
            None => Ok(None),
            Some(b) => Node::decode(&mut b.as_slice())
                .map(Some)
                .map_err(|_| TrieError::CorruptNode),
        }
    }

    /// Looks up `key`'s value under trie root `root`. `root ==
    /// Hash::ZERO` denotes the empty trie.
    pub async fn get(&self, root: &Hash, key: &Hash) -> Result<Option<Vec<u8>>, TrieError> {
        if *root == Hash::ZERO {
            return Ok(None);
        }
        let nibbles = bytes_to_nibbles(key.as_bytes());
        self.get_at(root, &nibbles).await
    }

    async fn get_at(&self, node_hash: &Hash, path: &[Nibble]) -> Result<Option<Vec<u8>>, TrieError> {
        let node = match self.load_node(node_hash).await? {
            Some(n) => n,
            None => return Ok(None),
        };
        match node {
            Node::Leaf { remainder, value } => {
                if remainder == path {
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }
            Node::Extension { remainder, child } => {
                if path.starts_with(&remainder[..]) {
                    Box::pin(self.get_at(&Hash(child), &path[remainder.len()..])).await
                } else {
                    Ok(None)
                }
            }
            Node::Branch { children, value } => {
                if path.is_empty() {
                    return Ok(value);
                }
                match children[path[0] as usize] {
                    Some(child) => Box::pin(self.get_at(&Hash(child), &path[1..])).await,
                    None => Ok(None),
                }
            }
        }
    }

    /// Inserts/overwrites `key -> value` under `root`, returning the new
    /// root and the set of newly created nodes to persist (the caller
    /// batches these into a `StorageBatch` alongside the rest of a
    /// block's writes; the trie never writes outside an explicit commit).
    pub async fn insert(
        &self,
        root: &Hash,
        key: &Hash,
        value: Vec<u8>,
    ) -> Result<(Hash, Vec<(Hash, Vec<u8>)>), TrieError> {
        let nibbles = bytes_to_nibbles(key.as_bytes());
        let mut new_nodes = Vec::new();
        let new_root = if *root == Hash::ZERO {
            let leaf = Node::Leaf {
                remainder: nibbles,
                value,
            };
            let h = leaf.hash();
            new_nodes.push((h, leaf.encode()));
            h
        } else {
            self.insert_at(root, &nibbles, value, &mut new_nodes).await?
        };
        Ok((new_root, new_nodes))
    }

    async fn insert_at(
        &self,
        node_hash: &Hash,
        path: &[Nibble],
        value: Vec<u8>,
        new_nodes: &mut Vec<(Hash, Vec<u8>)>,
    ) -> Result<Hash, TrieError> {
        let node = self
            .load_node(node_hash)
            .await?
            .ok_or(TrieError::CorruptNode)?;
        let replacement = match node {
            Node::Leaf { remainder, value: old_value } => {
                if remainder == path {
                    Node::Leaf { remainder, value }
                } else {
                    let h = self.split_leaf(remainder, old_value, path.to_vec(), value, new_nodes)?;
                    return Ok(h);
                }
            }
            Node::Extension { remainder, child } => {
                if path.starts_with(&remainder[..]) {
                    let new_child = Box::pin(self.insert_at(
                        &Hash(child),
                        &path[remainder.len()..],
                        value,
                        new_nodes,
                    ))
                    .await?;
                    Node::Extension {
                        remainder,
                        child: new_child.0,
                    }
                } else {
                    let h = self
                        .split_extension(remainder, child, path.to_vec(), value, new_nodes)
                        .await?;
                    return Ok(h);
                }
            }
            Node::Branch { mut children, value: branch_value } => {
                if path.is_empty() {
                    Node::Branch {
                        children,
                        value: Some(value),
                    }
                } else {
                    let idx = path[0] as usize;
                    let new_child = match children[idx] {
                        Some(child) => {
                            Box::pin(self.insert_at(&Hash(child), &path[1..], value, new_nodes))
                                .await?
                        }
                        None => {
                            let leaf = Node::Leaf {
                                remainder: path[1..].to_vec(),
                                value,
                            };
                            let h = leaf.hash();
                            new_nodes.push((h, leaf.encode()));
                            h
                        }
                    };
                    children[idx] = Some(new_child.0);
                    Node::Branch {
                        children,
                        value: branch_value,
                    }
                }
            }
        };
        let h = replacement.hash();
        new_nodes.push((h, replacement.encode()));
        Ok(h)
    }

    fn split_leaf(
        &self,
        existing_remainder: Vec<Nibble>,
        existing_value: Vec<u8>,
        new_path: Vec<Nibble>,
        new_value: Vec<u8>,
        new_nodes: &mut Vec<(Hash, Vec<u8>)>,
    ) -> Result<Hash, TrieError> {
        let common = common_prefix_len(&existing_remainder, &new_path);
        let mut branch_children: [Option<[u8; 32]>; 16] = Default::default();

        let existing_rest = &existing_remainder[common..];
        let new_rest = &new_path[common..];

        let existing_leaf = Node::Leaf {
            remainder: existing_rest[1..].to_vec(),
            value: existing_value,
        };
        let existing_hash = existing_leaf.hash();
        new_nodes.push((existing_hash, existing_leaf.encode()));
        branch_children[existing_rest[0] as usize] = Some(existing_hash.0);

        let (branch_value, final_children) = if new_rest.is_empty() {
            (Some(new_value), branch_children)
        } else {
            let new_leaf = Node::Leaf {
                remainder: new_rest[1..].to_vec(),
                value: new_value,
            };
            let new_hash = new_leaf.hash();
            new_nodes.push((new_hash, new_leaf.encode()));
            branch_children[new_rest[0] as usize] = Some(new_hash.0);
            (None, branch_children)
        };

        let branch = Node::Branch {
            children: Box::new(final_children),
            value: branch_value,
        };
        let branch_hash = branch.hash();
        new_nodes.push((branch_hash, branch.encode()));

        if common == 0 {
            Ok(branch_hash)
        } else {
            let ext = Node::Extension {
                remainder: existing_remainder[..common].to_vec(),
                child: branch_hash.0,
            };
            let ext_hash = ext.hash();
            new_nodes.push((ext_hash, ext.encode()));
            Ok(ext_hash)
        }
    }

    async fn split_extension(
        &self,
        existing_remainder: Vec<Nibble>,
        child: [u8; 32],
        new_path: Vec<Nibble>,
        new_value: Vec<u8>,
        new_nodes: &mut Vec<(Hash, Vec<u8>)>,
    ) -> Result<Hash, TrieError> {
        let common = common_prefix_len(&existing_remainder, &new_path);
        let mut branch_children: [Option<[u8; 32]>; 16] = Default::default();

        let existing_rest = &existing_remainder[common..];
        let existing_branch_slot = if existing_rest.len() == 1 {
            child
        } else {
            let ext = Node::Extension {
                remainder: existing_rest[1..].to_vec(),
                child,
            };
            let h = ext.hash();
            new_nodes.push((h, ext.encode()));
            h.0
        };
        branch_children[existing_rest[0] as usize] = Some(existing_branch_slot);

        let new_rest = &new_path[common..];
        let branch_value = if new_rest.is_empty() {
            Some(new_value)
        } else {
            let leaf = Node::Leaf {
                remainder: new_rest[1..].to_vec(),
                value: new_value,
            };
            let h = leaf.hash();
            new_nodes.push((h, leaf.encode()));
            branch_children[new_rest[0] as usize] = Some(h.0);
            None
        };

        let branch = Node::Branch {
            children: Box::new(branch_children),
            value: branch_value,
        };
        let branch_hash = branch.hash();
        new_nodes.push((branch_hash, branch.encode()));

        if common == 0 {
            Ok(branch_hash)
        } else {
            let ext = Node::Extension {
                remainder: existing_remainder[..common].to_vec(),
                child: branch_hash.0,
            };
            let ext_hash = ext.hash();
            new_nodes.push((ext_hash, ext.encode()));
            Ok(ext_hash)
        }
    }

    /// Persists a set of newly created nodes (as produced by [`Trie::insert`])
    /// into `batch`.
    pub fn stage_nodes(batch: &mut StorageBatch, nodes: &[(Hash, Vec<u8>)]) {
        for (hash, bytes) in nodes {
            batch.put(ColumnFamily::Trie, hash.as_bytes().to_vec(), bytes.clone());
        }
    }
}

fn common_prefix_len(a: &[Nibble], b: &[Nibble]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// A write-through staging overlay over a persisted `Trie`: reads check
/// the overlay first, then fall through to the persisted root. A block
/// application mutates only the overlay; on success the overlay's changes
/// (including newly created trie nodes) are folded into the parent via
/// [`StagingOverlay::into_batch`].
pub struct StagingOverlay {
    trie: Arc<Trie>,
    base_root: Hash,
    current_root: Hash,
    pending_nodes: HashMap<Hash, Vec<u8>>,
    overlay: HashMap<Hash, Option<Vec<u8>>>,
}

impl StagingOverlay {
    /// Opens a staging overlay rooted at `base_root`.
    pub fn new(trie: Arc<Trie>, base_root: Hash) -> Self {
        StagingOverlay {
            trie,
            base_root,
            current_root: base_root,
            pending_nodes: HashMap::new(),
            overlay: HashMap::new(),
        }
    }

    /// Reads `key`, checking the overlay before falling through to the
    /// persisted trie at `base_root`.
    pub async fn get(&self, key: &Hash) -> Result<Option<Vec<u8>>, TrieError> {
        if let Some(v) = self.overlay.get(key) {
            return Ok(v.clone());
        }
        self.trie.get(&self.base_root, key).await
    }

    /// Stages `key -> value`, updating the overlay's working root.
    pub async fn put(&mut self, key: Hash, value: Vec<u8>) -> Result<(), TrieError> {
        let (new_root, nodes) = self.trie.insert(&self.current_root, &key, value.clone()).await?;
        self.current_root = new_root;
        for (h, bytes) in nodes {
            self.pending_nodes.insert(h, bytes);
        }
        self.overlay.insert(key, Some(value));
        Ok(())
    }

    /// The overlay's current root, reflecting every `put` so far.
    pub fn root(&self) -> Hash {
        self.current_root
    }

    /// Consumes the overlay, returning its new root and a `StorageBatch`
    /// ready to be committed atomically alongside the rest of a block's
    /// writes.
    pub fn into_batch(self) -> (Hash, StorageBatch) {
        let mut batch = StorageBatch::new();
        let nodes: Vec<(Hash, Vec<u8>)> = self.pending_nodes.into_iter().collect();
        Trie::stage_nodes(&mut batch, &nodes);
        (self.current_root, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_storage::RedbStorage;

    async fn new_trie() -> (Trie, tempfile::TempPath) {
        let (storage, guard) = RedbStorage::open_temp().unwrap();
        (Trie::new(Arc::new(storage)), guard)
    }

    #[tokio::test]
    async fn empty_trie_returns_none() {
        let (trie, _g) = new_trie().await;
        assert_eq!(trie.get(&Hash::ZERO, &Hash::hash(b"k")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn single_insert_then_get() {
        let (trie, _g) = new_trie().await;
        let key = Hash::hash(b"contract-1");
        let (root, nodes) = trie.insert(&Hash::ZERO, &key, b"state-1".to_vec()).await.unwrap();
        // Persist so subsequent loads succeed.
        persist(&trie, &nodes).await;
        assert_eq!(trie.get(&root, &key).await.unwrap(), Some(b"state-1".to_vec()));
    }

    #[tokio::test]
    async fn two_inserts_both_readable() {
        let (trie, _g) = new_trie().await;
        let k1 = Hash::hash(b"a");
        let k2 = Hash::hash(b"b");
        let (root1, nodes1) = trie.insert(&Hash::ZERO, &k1, b"va".to_vec()).await.unwrap();
        persist(&trie, &nodes1).await;
        let (root2, nodes2) = trie.insert(&root1, &k2, b"vb".to_vec()).await.unwrap();
        persist(&trie, &nodes2).await;
        assert_eq!(trie.get(&root2, &k1).await.unwrap(), Some(b"va".to_vec()));
        assert_eq!(trie.get(&root2, &k2).await.unwrap(), Some(b"vb".to_vec()));
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let (trie, _g) = new_trie().await;
        let key = Hash::hash(b"k");
        let (root1, nodes1) = trie.insert(&Hash::ZERO, &key, b"v1".to_vec()).await.unwrap();
        persist(&trie, &nodes1).await;
        let (root2, nodes2) = trie.insert(&root1, &key, b"v2".to_vec()).await.unwrap();
        persist(&trie, &nodes2).await;
        assert_eq!(trie.get(&root2, &key).await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn staging_overlay_reads_uncommitted_writes() {
        let (storage, _g) = RedbStorage::open_temp().unwrap();
        let trie = Arc::new(Trie::new(Arc::new(storage)));
        let mut staging = StagingOverlay::new(trie, Hash::ZERO);
        let key = Hash::hash(b"x");
        staging.put(key, b"val".to_vec()).await.unwrap();
        assert_eq!(staging.get(&key).await.unwrap(), Some(b"val".to_vec()));
    }

    async fn persist(trie: &Trie, nodes: &[(Hash, Vec<u8>)]) {
        let mut batch = StorageBatch::new();
        Trie::stage_nodes(&mut batch, nodes);
        trie.storage.commit(batch).await.unwrap();
    }
}
