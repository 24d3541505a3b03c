// Path: crates/types/src/header.rs

//! `BlockHeader`, `BlockDeps`, `Target`, and block weight.

use crate::codec::{Codec, CodecError, Reader, Writer};
use crate::hash::Hash;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The timestamp (in milliseconds since the Unix epoch) assigned to every
/// genesis header, across every chain.
pub const GENESIS_TIMESTAMP: u64 = 0;

/// `blockDeps`: for a header whose chain is `ChainIndex(from, _)`, this
/// packs one "in-dep" per other group (`G-1` entries) followed by one
/// "out-dep" per group (`G` entries), for a total of `2G-1` entries.
///
/// The invariant `blockDeps.length == 2G-1` is enforced by the constructor
/// rather than left to callers, per the expanded spec (`SPEC_FULL.md` §3).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BlockDeps(Vec<Hash>);

impl BlockDeps {
    /// Builds a `BlockDeps`, requiring exactly `2*num_groups - 1` entries.
    pub fn new(deps: Vec<Hash>, num_groups: u16) -> Option<Self> {
        if deps.len() == 2 * num_groups as usize - 1 {
            Some(BlockDeps(deps))
        } else {
            None
        }
    }

    /// The fixed all-zero dep vector assigned to every genesis header.
    pub fn genesis(num_groups: u16) -> Self {
        BlockDeps(vec![Hash::ZERO; 2 * num_groups as usize - 1])
    }

    /// The raw dep hashes, in on-wire order.
    pub fn as_slice(&self) -> &[Hash] {
        &self.0
    }

    /// The `G-1` in-dep hashes (one per other group).
    pub fn in_deps(&self, num_groups: u16) -> &[Hash] {
        &self.0[0..(num_groups as usize - 1)]
    }

    /// The `G` out-dep hashes (one per destination group).
    pub fn out_deps(&self, num_groups: u16) -> &[Hash] {
        &self.0[(num_groups as usize - 1)..]
    }

    /// `outDeps[toGroup]`.
    pub fn uncle_hash(&self, to_group: u16, num_groups: u16) -> Hash {
        self.out_deps(num_groups)[to_group as usize]
    }

    /// `outDeps[fromGroup]`, which the header's well-formedness invariant
    /// requires to equal the header's own parent hash.
    pub fn parent_hash(&self, from_group: u16, num_groups: u16) -> Hash {
        self.out_deps(num_groups)[from_group as usize]
    }

    /// For a target group `g`, the dep hash `getInTip` reads when `g` is
    /// not this header's own `from` group: `blockDeps[g]` if `g <
    /// from_group`, else `blockDeps[g-1]`.
    pub fn get_dep_for_group(&self, g: u16, from_group: u16) -> Hash {
        if g < from_group {
            self.0[g as usize]
        } else {
            self.0[g as usize - 1]
        }
    }
}

impl Codec for BlockDeps {
    fn encode_to(&self, w: &mut Writer) {
        w.write_seq(&self.0, |w, h| w.write_hash(h));
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let deps = r.read_seq(|r| r.read_hash())?;
        Ok(BlockDeps(deps))
    }
}

/// A 4-byte compact encoding of a 256-bit non-negative integer: a size byte
/// followed by 3 mantissa bytes, shifted by `8*(size-3)`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Target {
    size: u8,
    mantissa: [u8; 3],
}

impl Target {
    /// Builds a `Target` from its raw compact encoding.
    pub fn from_compact(size: u8, mantissa: [u8; 3]) -> Self {
        Target { size, mantissa }
    }

    /// Encodes an arbitrary non-negative integer into the closest compact
    /// `Target` representation (used by tests and genesis configuration;
    /// mining code is expected to work with `Target` values directly).
    pub fn from_biguint(value: &BigUint) -> Self {
        let bytes = value.to_bytes_be();
        if bytes.len() <= 3 {
            let mut mantissa = [0u8; 3];
            mantissa[3 - bytes.len()..].copy_from_slice(&bytes);
            return Target {
                size: bytes.len() as u8,
                mantissa,
            };
        }
        let size = bytes.len() as u8;
        let mut mantissa = [0u8; 3];
        mantissa.copy_from_slice(&bytes[0..3]);
        Target { size, mantissa }
    }

    /// Decodes the compact representation into a full-precision integer.
    pub fn value(&self) -> BigUint {
        let mantissa = BigUint::from_bytes_be(&self.mantissa);
        let size = self.size as i32;
        if size >= 3 {
            mantissa << (8 * (size - 3))
        } else if size > 0 {
            mantissa >> (8 * (3 - size))
        } else {
            BigUint::zero()
        }
    }

    /// Proof-of-work validity check: `uint256(hash) <= target`.
    pub fn is_pow_valid(&self, hash: &Hash) -> bool {
        hash.as_u256() <= self.value()
    }

    /// The block's weight, approximately `2^256 / target`.
    pub fn weight(&self) -> Weight {
        let target = self.value();
        let denom = if target.is_zero() { BigUint::one() } else { target };
        let max = BigUint::one() << 256u32;
        Weight(max / denom)
    }
}

impl Codec for Target {
    fn encode_to(&self, w: &mut Writer) {
        w.write_u8(self.size);
        w.write_array(&self.mantissa);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let size = r.read_u8()?;
        let mantissa = r.read_array::<3>()?;
        Ok(Target { size, mantissa })
    }
}

/// A block's accumulated proof-of-work weight, `~2^256/target`. Total chain
/// weight sums these along flow tips (§4.2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Weight(pub BigUint);

impl Weight {
    /// The zero weight (used as an additive identity when summing).
    pub fn zero() -> Self {
        Weight(BigUint::zero())
    }
}

impl std::ops::Add for Weight {
    type Output = Weight;
    fn add(self, rhs: Weight) -> Weight {
        Weight(self.0 + rhs.0)
    }
}

impl<'a> std::ops::Add<&'a Weight> for Weight {
    type Output = Weight;
    fn add(self, rhs: &'a Weight) -> Weight {
        Weight(self.0 + &rhs.0)
    }
}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// A 256-bit proof-of-work nonce.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Nonce(pub [u8; 32]);

impl Codec for Nonce {
    fn encode_to(&self, w: &mut Writer) {
        w.write_array(&self.0);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Nonce(r.read_array::<32>()?))
    }
}

/// `(blockDeps, txsHash, timestamp, target, nonce)`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BlockHeader {
    /// The `2G-1` dependency hashes (see [`BlockDeps`]).
    pub block_deps: BlockDeps,
    /// The hash of the block's canonically encoded transaction list.
    pub txs_hash: Hash,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// The compact proof-of-work difficulty target.
    pub target: Target,
    /// The proof-of-work nonce.
    pub nonce: Nonce,
}

impl BlockHeader {
    /// Builds a genesis header: a fixed all-zero dep vector, `timestamp =
    /// GENESIS_TIMESTAMP`, and the given target/txs_hash/nonce.
    pub fn genesis(num_groups: u16, txs_hash: Hash, target: Target) -> Self {
        BlockHeader {
            block_deps: BlockDeps::genesis(num_groups),
            txs_hash,
            timestamp: GENESIS_TIMESTAMP,
            target,
            nonce: Nonce([0u8; 32]),
        }
    }

    /// Content-addressed identifier: `hash(serialize(self))`.
    pub fn hash(&self) -> Hash {
        Hash::hash(&self.to_bytes())
    }

    /// `true` iff `block_deps.length == 2*num_groups - 1`.
    pub fn has_valid_deps_length(&self, num_groups: u16) -> bool {
        self.block_deps.as_slice().len() == 2 * num_groups as usize - 1
    }

    /// `outDeps[toGroup]`.
    pub fn uncle_hash(&self, to_group: u16, num_groups: u16) -> Hash {
        self.block_deps.uncle_hash(to_group, num_groups)
    }

    /// The header's parent hash on its own `from` chain: `outDeps[from]`.
    pub fn parent_hash(&self, from_group: u16, num_groups: u16) -> Hash {
        self.block_deps.parent_hash(from_group, num_groups)
    }

    /// `true` iff the proof-of-work check `uint256(hash) <= target` holds.
    pub fn is_pow_valid(&self) -> bool {
        self.target.is_pow_valid(&self.hash())
    }
}

impl Codec for BlockHeader {
    fn encode_to(&self, w: &mut Writer) {
        self.block_deps.encode_to(w);
        w.write_hash(&self.txs_hash);
        w.write_u64(self.timestamp);
        self.target.encode_to(w);
        self.nonce.encode_to(w);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let block_deps = BlockDeps::decode_from(r)?;
        let txs_hash = r.read_hash()?;
        let timestamp = r.read_u64()?;
        let target = Target::decode_from(r)?;
        let nonce = Nonce::decode_from(r)?;
        Ok(BlockHeader {
            block_deps,
            txs_hash,
            timestamp,
            target,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_deps_length_invariant() {
        assert!(BlockDeps::new(vec![Hash::ZERO; 7], 4).is_some());
        assert!(BlockDeps::new(vec![Hash::ZERO; 6], 4).is_none());
    }

    #[test]
    fn genesis_deps_are_zero_and_right_length() {
        let deps = BlockDeps::genesis(4);
        assert_eq!(deps.as_slice().len(), 7);
        assert!(deps.as_slice().iter().all(|h| *h == Hash::ZERO));
    }

    #[test]
    fn target_compact_round_trips_small_values() {
        let original = BigUint::from(12345u32);
        let target = Target::from_biguint(&original);
        // Compact form loses precision beyond 3 mantissa bytes; for a value
        // that fits in 3 bytes it round-trips exactly.
        assert_eq!(target.value(), original);
    }

    #[test]
    fn header_codec_round_trips() {
        let header = BlockHeader::genesis(4, Hash::hash(b"txs"), Target::from_biguint(&BigUint::from(1u32)));
        let bytes = header.to_bytes();
        let decoded = BlockHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn max_target_pow_always_valid() {
        // A maximal target accepts any hash.
        let target = Target::from_biguint(&(BigUint::one() << 256u32));
        let hash = Hash::hash(b"anything");
        assert!(target.is_pow_valid(&hash));
    }

    #[test]
    fn weight_is_inversely_proportional_to_target() {
        let easy = Target::from_biguint(&(BigUint::one() << 200u32));
        let hard = Target::from_biguint(&(BigUint::one() << 100u32));
        assert!(hard.weight() > easy.weight());
    }
}
