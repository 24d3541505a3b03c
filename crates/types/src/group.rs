// Path: crates/types/src/group.rs

//! `GroupIndex` and `ChainIndex`: the sharding coordinates of the BlockFlow
//! DAG.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A group index in `[0, G)`, where `G` is the configured number of groups.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupIndex(u16);

impl GroupIndex {
    /// Builds a `GroupIndex`, panicking if `value >= num_groups`.
    ///
    /// This is only ever called with values derived from configuration or
    /// from already-validated on-chain data, so a panic here indicates a
    /// broken internal invariant rather than a reachable consensus failure.
    pub fn new(value: u16, num_groups: u16) -> Self {
        assert!(value < num_groups, "group index out of range");
        GroupIndex(value)
    }

    /// Builds a `GroupIndex` from an already-range-checked value.
    pub const fn from_raw(value: u16) -> Self {
        GroupIndex(value)
    }

    /// The raw group number.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Debug for GroupIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group({})", self.0)
    }
}

/// Identifies one of the `G x G` chains in the BlockFlow DAG.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug)]
pub struct ChainIndex {
    /// The group that mines/owns blocks on this chain.
    pub from: GroupIndex,
    /// The group this chain flows into.
    pub to: GroupIndex,
}

impl ChainIndex {
    /// Builds a `ChainIndex`.
    pub fn new(from: GroupIndex, to: GroupIndex) -> Self {
        ChainIndex { from, to }
    }

    /// `true` iff this is an intra-group chain (`from == to`), which serves
    /// as the weight anchor for its group.
    pub fn is_intra_group(&self) -> bool {
        self.from == self.to
    }
}

/// Iterates every `ChainIndex` for `num_groups` groups, in `(from, to)`
/// row-major order, matching the order the spec's `blockDeps` vector is
/// built in (`from`'s in-deps over the other `G-1` groups, then `from`'s
/// out-deps over all `G` groups, projected per `from`).
pub fn all_chain_indexes(num_groups: u16) -> impl Iterator<Item = ChainIndex> {
    (0..num_groups).flat_map(move |from| {
        (0..num_groups).map(move |to| {
            ChainIndex::new(GroupIndex::from_raw(from), GroupIndex::from_raw(to))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intra_group_detection() {
        let g0 = GroupIndex::from_raw(0);
        let g1 = GroupIndex::from_raw(1);
        assert!(ChainIndex::new(g0, g0).is_intra_group());
        assert!(!ChainIndex::new(g0, g1).is_intra_group());
    }

    #[test]
    fn all_chain_indexes_count() {
        let chains: Vec<_> = all_chain_indexes(4).collect();
        assert_eq!(chains.len(), 16);
    }

    #[test]
    #[should_panic(expected = "group index out of range")]
    fn group_index_out_of_range_panics() {
        GroupIndex::new(4, 4);
    }
}
