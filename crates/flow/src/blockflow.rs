// Path: crates/flow/src/blockflow.rs

//! The BlockFlow DAG engine (§4.2): per-group flow tips, best-dependency
//! selection, and history locators for block sync.
//!
//! `calBestDeps` walks every chain slot's `tryExtend`: gather that chain's
//! candidate tips (`tips()`, every currently childless header), filter to
//! those in an ancestor/descendant relation with the slot's present value
//! (`isBefore`, so a slot only ever advances to something that actually
//! extends it, never sideways to an unrelated fork), sort the survivors by
//! `blockHashOrdering` descending so every node tries the same candidate
//! first, then `tryMerge`/`adopt_if_safe` the sorted candidates in turn,
//! keeping the first that is both conflict-free and does not lower
//! `calWeight`.

use alephium_types::header::{BlockDeps, BlockHeader, Weight};
use alephium_types::hash::block_hash_ordering;
use alephium_types::{ChainIndex, GroupIndex, Hash};
use std::collections::HashMap;

use crate::chain::BlockHashChain;
use crate::conflict::ConflictCache;
use crate::error::FlowError;

/// A group's view of every chain's tip: one projected tip per other
/// group's own intra-chain (`in_tips`, `G-1` entries) and one tip per
/// destination chain `(group, t)` (`out_tips`, `G` entries, with
/// `out_tips[group]` being this group's own intra-chain tip).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowTips {
    /// One projected tip per other group (ascending group index, `from`
    /// excluded), `G-1` entries.
    pub in_tips: Vec<Hash>,
    /// One tip per destination chain `(from, t)`, `G` entries.
    pub out_tips: Vec<Hash>,
}

impl FlowTips {
    /// Derives the flow tips implied by `header`, the current tip of group
    /// `from`'s intra-chain: the header's declared deps, with its own
    /// out-slot overridden by `header`'s own hash (this header *is* the new
    /// state for its own group, whereas its declared out-dep is its
    /// parent's).
    pub fn from_header(header: &BlockHeader, from: u16, num_groups: u16) -> Self {
        let in_tips = header.block_deps.in_deps(num_groups).to_vec();
        let mut out_tips = header.block_deps.out_deps(num_groups).to_vec();
        out_tips[from as usize] = header.hash();
        FlowTips { in_tips, out_tips }
    }

    /// Reassembles a `BlockDeps` from this flow state, in the same
    /// `in_tips ++ out_tips` layout `BlockHeader::block_deps` uses.
    pub fn to_block_deps(&self, num_groups: u16) -> Option<BlockDeps> {
        let mut deps = self.in_tips.clone();
        deps.extend_from_slice(&self.out_tips);
        BlockDeps::new(deps, num_groups)
    }
}

/// The BlockFlow DAG: one `BlockHashChain` per `(from, to)` pair, plus the
/// conflict cache and the cached best-deps per owned group.
pub struct BlockFlow {
    num_groups: u16,
    chains: HashMap<ChainIndex, BlockHashChain>,
    conflict_cache: ConflictCache,
    best_deps: HashMap<u16, BlockDeps>,
}

impl BlockFlow {
    /// Builds a BlockFlow instance over an already-opened set of per-chain
    /// stores (one per `(from, to)` pair).
    pub fn new(num_groups: u16, chains: HashMap<ChainIndex, BlockHashChain>, conflict_cache: ConflictCache) -> Self {
        BlockFlow {
            num_groups,
            chains,
            conflict_cache,
            best_deps: HashMap::new(),
        }
    }

    /// Borrows the store for `(from, to)`.
    pub fn chain(&self, index: ChainIndex) -> Result<&BlockHashChain, FlowError> {
        self.chains.get(&index).ok_or(FlowError::UnknownChain {
            from: index.from.value(),
            to: index.to.value(),
        })
    }

    /// Mutably borrows the store for `(from, to)`.
    pub fn chain_mut(&mut self, index: ChainIndex) -> Result<&mut BlockHashChain, FlowError> {
        self.chains.get_mut(&index).ok_or(FlowError::UnknownChain {
            from: index.from.value(),
            to: index.to.value(),
        })
    }

    /// The conflict cache, read-only (validation consults it; `add_block`
    /// updates it).
    pub fn conflict_cache(&self) -> &ConflictCache {
        &self.conflict_cache
    }

    /// The conflict cache, mutable.
    pub fn conflict_cache_mut(&mut self) -> &mut ConflictCache {
        &mut self.conflict_cache
    }

    /// `calWeight`: the total accumulated proof-of-work weight implied by a
    /// group's flow tips — the sum of each of the `G` destination chains'
    /// weight at its current `out_tips` entry.
    pub fn cal_weight(&self, flow_tips: &FlowTips, group: u16) -> Result<Weight, FlowError> {
        let mut total = Weight::zero();
        for t in 0..self.num_groups {
            let index = ChainIndex::new(GroupIndex::from_raw(group), GroupIndex::from_raw(t));
            let hash = flow_tips.out_tips[t as usize];
            let chain = self.chain(index)?;
            if let Ok(weight) = chain.weight_of(&hash) {
                total = total + weight;
            }
        }
        Ok(total)
    }

    /// `getBestTipUnsafe`: the heaviest tip known on group `group`'s own
    /// intra-chain — its canonical tip, since `BlockHashChain` already
    /// keeps the canonical chain pinned to the heaviest known header.
    pub fn best_tip_unsafe(&self, group: u16) -> Result<Hash, FlowError> {
        let index = ChainIndex::new(GroupIndex::from_raw(group), GroupIndex::from_raw(group));
        Ok(self.chain(index)?.canonical_tip())
    }

    /// `calBestDeps`: the dependency set a new block mined on group
    /// `group` should declare. Starts from `group`'s own best tip, then
    /// tries to advance every other chain's slot to the best extending
    /// candidate tip on that chain, keeping the advance only if it does
    /// not introduce a conflict (§4.3).
    pub fn cal_best_deps(&self, group: u16) -> Result<BlockDeps, FlowError> {
        let best_tip = self.best_tip_unsafe(group)?;
        let own_index = ChainIndex::new(GroupIndex::from_raw(group), GroupIndex::from_raw(group));
        let base_header = self.chain(own_index)?.header(&best_tip)?.clone();
        let mut flow_tips = FlowTips::from_header(&base_header, group, self.num_groups);

        for t in 0..self.num_groups {
            if t == group {
                continue;
            }
            self.try_advance_out(&mut flow_tips, group, t)?;
        }

        for l in 0..self.num_groups {
            if l == group {
                continue;
            }
            self.try_advance_in(&mut flow_tips, group, l)?;
        }

        flow_tips.to_block_deps(self.num_groups).ok_or(FlowError::UnknownChain { from: group, to: group })
    }

    /// `tryExtend`'s candidate set for one chain slot: every tip that is
    /// `current` itself or a genuine descendant of it, sorted by
    /// `blockHashOrdering` descending.
    fn extending_candidates(&self, index: ChainIndex, current: Hash) -> Result<Vec<Hash>, FlowError> {
        let chain = self.chain(index)?;
        let mut candidates: Vec<Hash> = chain.tips().copied().filter(|tip| chain.is_before(&current, tip)).collect();
        candidates.sort_by(|a, b| block_hash_ordering(b, a));
        Ok(candidates)
    }

    fn try_advance_out(&self, flow_tips: &mut FlowTips, group: u16, t: u16) -> Result<(), FlowError> {
        let index = ChainIndex::new(GroupIndex::from_raw(group), GroupIndex::from_raw(t));
        let current = flow_tips.out_tips[t as usize];
        for candidate in self.extending_candidates(index, current)? {
            let mut trial = flow_tips.clone();
            trial.out_tips[t as usize] = candidate;
            if self.adopt_if_safe(flow_tips, trial, group)? {
                break;
            }
        }
        Ok(())
    }

    fn try_advance_in(&self, flow_tips: &mut FlowTips, group: u16, l: u16) -> Result<(), FlowError> {
        let index = ChainIndex::new(GroupIndex::from_raw(l), GroupIndex::from_raw(l));
        let position = in_tip_position(l, group);
        let current = flow_tips.in_tips[position];
        for candidate in self.extending_candidates(index, current)? {
            let mut trial = flow_tips.clone();
            trial.in_tips[position] = candidate;
            if self.adopt_if_safe(flow_tips, trial, group)? {
                break;
            }
        }
        Ok(())
    }

    /// `tryMerge`: adopts `trial` in place of `flow_tips` iff it is
    /// conflict-free and does not lower `calWeight`. Returns whether it was
    /// adopted, so `try_advance_out`/`try_advance_in` can stop at the first
    /// sorted candidate that sticks.
    fn adopt_if_safe(&self, flow_tips: &mut FlowTips, trial: FlowTips, group: u16) -> Result<bool, FlowError> {
        let hashes: Vec<alephium_types::BlockHash> = trial
            .out_tips
            .iter()
            .chain(trial.in_tips.iter())
            .map(|h| alephium_types::BlockHash::new(*h))
            .collect();
        if self.conflict_cache.is_conflicted(&hashes) {
            return Ok(false);
        }
        let current_weight = self.cal_weight(flow_tips, group)?;
        let trial_weight = self.cal_weight(&trial, group)?;
        if trial_weight >= current_weight {
            *flow_tips = trial;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// `getBestDeps`: the cached best-deps for an owned group, recomputing
    /// it first if absent.
    pub fn best_deps(&mut self, group: u16) -> Result<BlockDeps, FlowError> {
        if let Some(cached) = self.best_deps.get(&group) {
            return Ok(cached.clone());
        }
        let deps = self.cal_best_deps(group)?;
        self.best_deps.insert(group, deps.clone());
        Ok(deps)
    }

    /// Recomputes and re-caches best-deps for every group in `owned`
    /// (called after any header is accepted into any chain).
    pub fn update_best_deps(&mut self, owned: &[u16]) -> Result<(), FlowError> {
        for &group in owned {
            let deps = self.cal_best_deps(group)?;
            self.best_deps.insert(group, deps);
        }
        Ok(())
    }
}

/// The position of group `l`'s projection within a `from = group`
/// flow-tips' `in_tips` vector (ascending group order, `group` itself
/// excluded).
fn in_tip_position(l: u16, group: u16) -> usize {
    if l < group {
        l as usize
    } else {
        l as usize - 1
    }
}

/// `HistoryLocators.sampleHeights`: an exponentially-thinning sample of
/// heights from `max_height` down to `0`, used to ask a peer "which of
/// these heights do we already agree on" without listing every height.
pub fn sample_heights(max_height: u64) -> Vec<u64> {
    let mut heights = vec![max_height];
    let mut step = 1u64;
    let mut h = max_height;
    loop {
        if h < step {
            break;
        }
        h -= step;
        heights.push(h);
        if h == 0 {
            break;
        }
        step *= 2;
    }
    if *heights.last().unwrap() != 0 {
        heights.push(0);
    }
    heights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_heights_starts_at_max_and_ends_at_zero() {
        let heights = sample_heights(20);
        assert_eq!(heights[0], 20);
        assert_eq!(*heights.last().unwrap(), 0);
        assert!(heights.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn sample_heights_of_zero_is_just_zero() {
        assert_eq!(sample_heights(0), vec![0]);
    }

    #[test]
    fn in_tip_position_skips_own_group() {
        assert_eq!(in_tip_position(0, 2), 0);
        assert_eq!(in_tip_position(3, 2), 2);
    }
}
