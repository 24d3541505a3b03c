// Path: crates/test-utils/src/genesis.rs

//! Genesis block and `BlockFlow` builders, generalizing the per-test
//! `genesis_block` helper `alephium-flow`'s own `chain` tests hand-roll, so
//! every crate's tests build genesis the same way instead of each
//! reinventing a one-off.

use std::collections::HashMap;
use std::sync::Arc;

use alephium_api::storage::Storage;
use alephium_flow::chain::BlockHashChain;
use alephium_flow::conflict::ConflictCache;
use alephium_flow::error::FlowError;
use alephium_flow::BlockFlow;
use alephium_types::group::all_chain_indexes;
use alephium_types::header::{BlockHeader, Target};
use alephium_types::{Block, Hash};
use num_bigint::BigUint;

/// Builds a genesis block for a chain rooted at `seed`; distinct seeds
/// produce distinct genesis hashes (needed since every `(from, to)` chain
/// in the DAG needs its own genesis).
pub fn genesis_block(num_groups: u16, seed: &[u8]) -> Block {
    let header = BlockHeader::genesis(num_groups, Hash::hash(seed), Target::from_biguint(&BigUint::from(1u32)));
    Block::new(header, vec![])
}

/// Opens every `(from, to)` chain over its own genesis block (seeded by
/// its coordinates, so every chain gets a distinct genesis hash) and
/// assembles them into a fresh `BlockFlow`.
pub async fn genesis_flow(
    num_groups: u16,
    storage: Arc<dyn Storage>,
    conflict_keep_duration: std::time::Duration,
) -> Result<BlockFlow, FlowError> {
    let mut chains = HashMap::new();
    for index in all_chain_indexes(num_groups) {
        let seed = format!("genesis-{}-{}", index.from.value(), index.to.value());
        let genesis = genesis_block(num_groups, seed.as_bytes());
        let chain = BlockHashChain::genesis(index, num_groups, genesis, storage.clone()).await?;
        chains.insert(index, chain);
    }
    Ok(BlockFlow::new(num_groups, chains, ConflictCache::new(conflict_keep_duration)))
}

/// The genesis hash of the intra-group chain for `group`, used to populate
/// a `Hello` handshake or an identity check.
pub fn genesis_hash_of(num_groups: u16, group: u16) -> Hash {
    let seed = format!("genesis-{}-{}", group, group);
    genesis_block(num_groups, seed.as_bytes()).hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_storage::RedbStorage;

    #[tokio::test]
    async fn genesis_flow_opens_every_chain() {
        let (storage, _guard) = RedbStorage::open_temp().unwrap();
        let flow = genesis_flow(2, Arc::new(storage), std::time::Duration::from_secs(3600)).await.unwrap();
        for index in all_chain_indexes(2) {
            assert_eq!(flow.chain(index).unwrap().height(), 0);
        }
    }

    #[test]
    fn distinct_chains_get_distinct_genesis_hashes() {
        assert_ne!(genesis_hash_of(2, 0), genesis_hash_of(2, 1));
    }
}
