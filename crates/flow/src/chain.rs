// Path: crates/flow/src/chain.rs

//! `BlockHashChain`: the per-(from,to) chain store — headers, bodies, the
//! height index, the canonical chain, and the current tip set.
//!
//! Mutation only ever happens from the single-writer orchestrator (§4.7), so
//! this type takes `&mut self` for every write and needs no internal
//! locking; the in-memory indices are the source of truth and `Storage` is
//! used purely for durability.

use alephium_api::storage::{ColumnFamily, Storage, StorageBatch};
use alephium_types::codec::Codec;
use alephium_types::error::IoError;
use alephium_types::hash::block_hash_ordering;
use alephium_types::header::{BlockHeader, Weight};
use alephium_types::{Block, ChainIndex, Hash};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::FlowError;

/// A single entry in the chain's header index.
#[derive(Clone, Debug)]
struct Entry {
    header: BlockHeader,
    height: u64,
    /// Cumulative proof-of-work weight from genesis to this header,
    /// inclusive (§4.2's notion of chain weight).
    chain_weight: Weight,
}

/// The store for one `(from, to)` chain: every header/body ever accepted,
/// indexed by height and canonical-chain membership, plus the current tip
/// set (headers with no known child).
pub struct BlockHashChain {
    index: ChainIndex,
    num_groups: u16,
    storage: Arc<dyn Storage>,
    entries: HashMap<Hash, Entry>,
    /// height -> canonical hash at that height.
    canonical: Vec<Hash>,
    /// hash -> its children (for tip detection and `isCanonical`'s reorg
    /// bookkeeping).
    children: HashMap<Hash, HashSet<Hash>>,
    tips: HashSet<Hash>,
    genesis_hash: Hash,
}

impl BlockHashChain {
    /// Opens a chain store rooted at `genesis`, writing it through if this
    /// is the first time this chain has been seen.
    pub async fn genesis(
        index: ChainIndex,
        num_groups: u16,
        genesis: Block,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, FlowError> {
        let hash = genesis.hash();
        let mut chain = BlockHashChain {
            index,
            num_groups,
            storage,
            entries: HashMap::new(),
            canonical: Vec::new(),
            children: HashMap::new(),
            tips: HashSet::new(),
            genesis_hash: hash,
        };
        if chain.get_header(&hash).await?.is_none() {
            chain.insert(genesis.header.clone(), Weight::zero(), true).await?;
            chain.store_block(&genesis).await?;
        } else {
            chain.entries.insert(
                hash,
                Entry {
                    header: genesis.header.clone(),
                    height: 0,
                    chain_weight: genesis.header.target.weight(),
                },
            );
            chain.canonical.push(hash);
            chain.tips.insert(hash);
        }
        Ok(chain)
    }

    /// This chain's coordinates.
    pub fn index(&self) -> ChainIndex {
        self.index
    }

    /// The genesis hash for this chain.
    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    async fn get_header(&self, hash: &Hash) -> Result<Option<BlockHeader>, FlowError> {
        if let Some(e) = self.entries.get(hash) {
            return Ok(Some(e.header.clone()));
        }
        let bytes = self.storage.get(ColumnFamily::Headers, hash.as_bytes()).await?;
        match bytes {
            None => Ok(None),
            Some(b) => BlockHeader::from_bytes(&b)
                .map(Some)
                .map_err(|_| IoError::Codec("corrupt header".into()).into()),
        }
    }

    /// Looks up a header already accepted into this chain.
    pub fn header(&self, hash: &Hash) -> Result<&BlockHeader, FlowError> {
        self.entries.get(hash).map(|e| &e.header).ok_or(FlowError::UnknownHash(*hash))
    }

    /// The height of an accepted header.
    pub fn height_of(&self, hash: &Hash) -> Result<u64, FlowError> {
        self.entries.get(hash).map(|e| e.height).ok_or(FlowError::UnknownHash(*hash))
    }

    /// The cumulative chain weight of an accepted header.
    pub fn weight_of(&self, hash: &Hash) -> Result<Weight, FlowError> {
        self.entries
            .get(hash)
            .map(|e| e.chain_weight.clone())
            .ok_or(FlowError::UnknownHash(*hash))
    }

    /// `true` iff `hash` is on the canonical chain.
    pub fn is_canonical(&self, hash: &Hash) -> bool {
        self.entries
            .get(hash)
            .map(|e| self.canonical.get(e.height as usize) == Some(hash))
            .unwrap_or(false)
    }

    /// The canonical hash at `height`, if the chain is at least that tall.
    pub fn canonical_at(&self, height: u64) -> Option<Hash> {
        self.canonical.get(height as usize).copied()
    }

    /// The tip of the canonical chain: the heaviest entry at the greatest
    /// canonical height. Distinct from `tips()`, which includes every
    /// childless header, canonical or not.
    pub fn canonical_tip(&self) -> Hash {
        *self.canonical.last().unwrap_or(&self.genesis_hash)
    }

    /// Every currently childless header (candidates for extension).
    pub fn tips(&self) -> impl Iterator<Item = &Hash> {
        self.tips.iter()
    }

    /// Current canonical chain height (genesis is height 0).
    pub fn height(&self) -> u64 {
        self.canonical.len().saturating_sub(1) as u64
    }

    fn parent_hash(&self, header: &BlockHeader) -> Hash {
        header.parent_hash(self.index.from.value(), self.num_groups)
    }

    /// Accepts a header whose parent is already known on this chain,
    /// reorganizing the canonical chain if the new header's chain weight
    /// exceeds the current canonical tip's (`reorgIfBetter`). Returns `true`
    /// if this header (or a descendant reached via it) became canonical.
    pub async fn add_header(&mut self, header: BlockHeader) -> Result<bool, FlowError> {
        let hash = header.hash();
        if self.entries.contains_key(&hash) {
            return Ok(self.is_canonical(&hash));
        }
        let parent = self.parent_hash(&header);
        let parent_entry = self
            .entries
            .get(&parent)
            .ok_or(FlowError::UnknownHash(parent))?
            .clone();
        let chain_weight = parent_entry.chain_weight.clone() + header.target.weight();
        // Equal-weight ties must resolve identically on every node (spec's
        // `blockHashOrdering`), or two nodes receiving the same two blocks
        // in different arrival order diverge permanently on which is
        // canonical.
        let became_canonical = match chain_weight.cmp(&self.canonical_weight()) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => block_hash_ordering(&hash, &self.canonical_tip()) == std::cmp::Ordering::Less,
            std::cmp::Ordering::Less => false,
        };
        self.insert(header, chain_weight, became_canonical).await?;
        Ok(became_canonical)
    }

    fn canonical_weight(&self) -> Weight {
        self.entries
            .get(&self.canonical_tip())
            .map(|e| e.chain_weight.clone())
            .unwrap_or_else(Weight::zero)
    }

    async fn insert(&mut self, header: BlockHeader, chain_weight: Weight, reorg: bool) -> Result<(), FlowError> {
        let hash = header.hash();
        let parent = self.parent_hash(&header);
        let height = if hash == self.genesis_hash {
            0
        } else {
            self.entries.get(&parent).map(|e| e.height + 1).unwrap_or(0)
        };

        self.tips.remove(&parent);
        self.tips.insert(hash);
        self.children.entry(parent).or_default().insert(hash);

        let mut batch = StorageBatch::new();
        batch.put(ColumnFamily::Headers, hash.as_bytes().to_vec(), header.to_bytes());
        self.entries.insert(hash, Entry { header, height, chain_weight: chain_weight.clone() });

        if reorg {
            self.reorg_to(hash, height, &mut batch);
        }
        self.storage.commit(batch).await?;
        Ok(())
    }

    fn reorg_to(&mut self, tip: Hash, tip_height: u64, batch: &mut StorageBatch) {
        self.canonical.resize(tip_height as usize + 1, Hash::ZERO);
        let mut cursor = tip;
        let mut h = tip_height;
        loop {
            if self.canonical.get(h as usize) == Some(&cursor) {
                break;
            }
            self.canonical[h as usize] = cursor;
            batch.put(
                ColumnFamily::Canonical,
                h.to_be_bytes().to_vec(),
                cursor.as_bytes().to_vec(),
            );
            if h == 0 {
                break;
            }
            let header = &self.entries.get(&cursor).expect("entry just inserted or ancestor").header;
            cursor = self.parent_hash(header);
            h -= 1;
        }
    }

    /// Persists a block body (header must already be accepted via
    /// `add_header`/`genesis`).
    pub async fn store_block(&mut self, block: &Block) -> Result<(), FlowError> {
        let mut batch = StorageBatch::new();
        batch.put(
            ColumnFamily::Blocks,
            block.hash().as_bytes().to_vec(),
            block.to_bytes(),
        );
        self.storage.commit(batch).await?;
        Ok(())
    }

    /// Loads a full block body, if this chain has one stored for `hash`.
    pub async fn get_block(&self, hash: &Hash) -> Result<Option<Block>, FlowError> {
        let bytes = self.storage.get(ColumnFamily::Blocks, hash.as_bytes()).await?;
        match bytes {
            None => Ok(None),
            Some(b) => Block::from_bytes(&b).map(Some).map_err(|_| IoError::Codec("corrupt block".into()).into()),
        }
    }

    /// `isBefore`: `true` iff `ancestor` is `descendant` itself or an actual
    /// ancestor of it on this chain.
    pub fn is_before(&self, ancestor: &Hash, descendant: &Hash) -> bool {
        ancestor == descendant || self.hashes_between(ancestor, descendant).is_ok()
    }

    /// Walks back from `descendant` to `ancestor`, inclusive of both ends,
    /// oldest first. Errors if `ancestor` is not actually an ancestor.
    pub fn hashes_between(&self, ancestor: &Hash, descendant: &Hash) -> Result<Vec<Hash>, FlowError> {
        let mut path = vec![*descendant];
        let mut cursor = *descendant;
        loop {
            if cursor == *ancestor {
                path.reverse();
                return Ok(path);
            }
            if cursor == self.genesis_hash {
                return Err(FlowError::NotAncestor {
                    ancestor: *ancestor,
                    descendant: *descendant,
                });
            }
            let header = self.header(&cursor)?;
            cursor = self.parent_hash(header);
            path.push(cursor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_storage::RedbStorage;
    use alephium_types::header::{BlockDeps, Target, GENESIS_TIMESTAMP};
    use alephium_types::GroupIndex;
    use num_bigint::BigUint;

    fn genesis_block(num_groups: u16) -> Block {
        let header = BlockHeader::genesis(num_groups, Hash::hash(b"genesis-txs"), Target::from_biguint(&BigUint::from(1u32)));
        Block::new(header, vec![])
    }

    fn child_header(parent: &BlockHeader, num_groups: u16, from: u16, salt: u8) -> BlockHeader {
        let mut deps = vec![Hash::ZERO; 2 * num_groups as usize - 1];
        deps[num_groups as usize - 1 + from as usize] = parent.hash();
        BlockHeader {
            block_deps: BlockDeps::new(deps, num_groups).unwrap(),
            txs_hash: Hash::hash(&[salt]),
            timestamp: GENESIS_TIMESTAMP + 1,
            target: parent.target,
            nonce: alephium_types::header::Nonce([salt; 32]),
        }
    }

    async fn fresh_chain() -> BlockHashChain {
        let storage = Arc::new(RedbStorage::open_temp().unwrap());
        let index = ChainIndex::new(GroupIndex::new(0, 2), GroupIndex::new(0, 2));
        BlockHashChain::genesis(index, 2, genesis_block(2), storage).await.unwrap()
    }

    #[tokio::test]
    async fn genesis_is_canonical_tip() {
        let chain = fresh_chain().await;
        assert_eq!(chain.canonical_tip(), chain.genesis_hash());
        assert_eq!(chain.height(), 0);
    }

    #[tokio::test]
    async fn heavier_child_becomes_canonical() {
        let mut chain = fresh_chain().await;
        let genesis = chain.header(&chain.genesis_hash()).unwrap().clone();
        let child = child_header(&genesis, 2, 0, 7);
        let became = chain.add_header(child.clone()).await.unwrap();
        assert!(became);
        assert_eq!(chain.canonical_tip(), child.hash());
        assert_eq!(chain.height(), 1);
        assert!(chain.is_canonical(&child.hash()));
    }

    #[tokio::test]
    async fn unknown_parent_is_rejected() {
        let mut chain = fresh_chain().await;
        let orphan = child_header(
            &BlockHeader::genesis(2, Hash::hash(b"other"), Target::from_biguint(&BigUint::from(1u32))),
            2,
            0,
            9,
        );
        assert!(chain.add_header(orphan).await.is_err());
    }

    #[tokio::test]
    async fn equal_weight_siblings_break_tie_by_hash_ordering() {
        let mut chain = fresh_chain().await;
        let genesis = chain.header(&chain.genesis_hash()).unwrap().clone();
        let a = child_header(&genesis, 2, 0, 1);
        let b = child_header(&genesis, 2, 0, 2);
        let expected_tip = std::cmp::min_by(a.hash(), b.hash(), block_hash_ordering);

        chain.add_header(a.clone()).await.unwrap();
        chain.add_header(b.clone()).await.unwrap();
        assert_eq!(chain.canonical_tip(), expected_tip);

        // Same two blocks, opposite arrival order: the outcome must not
        // depend on which arrived first.
        let mut other_order = fresh_chain().await;
        other_order.add_header(b).await.unwrap();
        other_order.add_header(a).await.unwrap();
        assert_eq!(other_order.canonical_tip(), expected_tip);
    }

    #[tokio::test]
    async fn hashes_between_walks_ancestor_chain() {
        let mut chain = fresh_chain().await;
        let genesis = chain.header(&chain.genesis_hash()).unwrap().clone();
        let child = child_header(&genesis, 2, 0, 3);
        chain.add_header(child.clone()).await.unwrap();
        let path = chain.hashes_between(&genesis.hash(), &child.hash()).unwrap();
        assert_eq!(path, vec![genesis.hash(), child.hash()]);
    }
}
