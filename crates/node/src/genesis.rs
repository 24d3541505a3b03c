// Path: crates/node/src/genesis.rs

//! Builds the genesis block for every `(from, to)` chain and opens them
//! into a `BlockFlow`, mirroring the teacher's `orchestration.rs` reading
//! a genesis file from disk — this kernel has no wallet/allocation file
//! format to read, so each chain's genesis is derived deterministically
//! from its own coordinates instead.

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

/// Builds the genesis block for chain `(from, to)` under an `G`-group DAG,
/// with a target loose enough that the genesis nonce (all zero) is always
/// valid PoW.
pub fn genesis_block(num_groups: u16, from: u16, to: u16) -> Block {
    let seed = format!("alephium-kernel-genesis-{from}-{to}");
    let header = BlockHeader::genesis(num_groups, Hash::hash(seed.as_bytes()), Target::from_biguint(&BigUint::from(1u32)));
    Block::new(header, vec![])
}

/// Builds and opens every `(from, to)` chain over its own genesis block,
/// assembled into a fresh `BlockFlow`.
pub async fn open_genesis_flow(
    num_groups: u16,
    storage: Arc<dyn Storage>,
    conflict_keep_duration: std::time::Duration,
) -> Result<(BlockFlow, Vec<Block>), FlowError> {
    let mut chains = HashMap::new();
    let mut genesis_blocks = Vec::new();
    for index in all_chain_indexes(num_groups) {
        let genesis = genesis_block(num_groups, index.from.value(), index.to.value());
        let chain = BlockHashChain::genesis(index, num_groups, genesis.clone(), storage.clone()).await?;
        chains.insert(index, chain);
        genesis_blocks.push(genesis);
    }
    let flow = BlockFlow::new(num_groups, chains, ConflictCache::new(conflict_keep_duration));
    Ok((flow, genesis_blocks))
}

/// The genesis hash of the intra-group chain for `group`, used as this
/// configuration's chain identity.
pub fn identity_hash(num_groups: u16, group: u16) -> Hash {
    genesis_block(num_groups, group, group).hash()
}
