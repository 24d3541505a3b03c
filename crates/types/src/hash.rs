// Path: crates/types/src/hash.rs

//! Content-addressed 32-byte hashes.
//!
//! `BlockHash` and `TxId` both wrap a plain [`Hash`] but are distinct types
//! so that a block hash can never be silently passed where a transaction id
//! is expected (and vice versa).

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A 32-byte content-addressed identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The all-zero hash used as a sentinel (e.g. genesis dep slots).
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Hashes an arbitrary byte slice with Blake2b-256, the kernel's default
    /// content-addressing function.
    pub fn hash(bytes: &[u8]) -> Hash {
        let mut hasher = Blake2b256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Hash(out)
    }

    /// Hashes the concatenation of two byte slices without an intermediate
    /// allocation beyond what `update` needs; used for `hash(txId ‖
    /// outputIndex)`-style derivations.
    pub fn hash_concat(a: &[u8], b: &[u8]) -> Hash {
        let mut hasher = Blake2b256::new();
        hasher.update(a);
        hasher.update(b);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Hash(out)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Interprets the hash as a big-endian 256-bit unsigned integer, used by
    /// proof-of-work validity checks (`uint256(hash) <= target`).
    pub fn as_u256(&self) -> num_bigint::BigUint {
        num_bigint::BigUint::from_bytes_be(&self.0)
    }

    /// The single byte used to bind a lockup script to a group:
    /// `hash(lockupScript).xorByte mod G`.
    pub fn xor_byte(&self) -> u8 {
        self.0.iter().fold(0u8, |acc, b| acc ^ b)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

/// A deterministic, lexicographic ordering over hashes, used wherever the
/// spec calls for `blockHashOrdering` to break ties identically on every
/// node.
pub fn block_hash_ordering(a: &Hash, b: &Hash) -> std::cmp::Ordering {
    a.0.cmp(&b.0)
}

macro_rules! hash_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
        pub struct $name(pub Hash);

        impl $name {
            /// Wraps a raw [`Hash`].
            pub fn new(hash: Hash) -> Self {
                Self(hash)
            }

            /// Returns the underlying raw hash.
            pub fn hash(&self) -> Hash {
                self.0
            }

            /// Returns the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                self.0.as_bytes()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Hash> for $name {
            fn from(hash: Hash) -> Self {
                Self(hash)
            }
        }
    };
}

hash_newtype!(BlockHash, "A content-addressed identifier for a block header.");
hash_newtype!(TxId, "A content-addressed identifier for a transaction (`hash(unsigned)`).");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = Hash::hash(b"alephium");
        let b = Hash::hash(b"alephium");
        assert_eq!(a, b);
    }

    #[test]
    fn different_input_different_hash() {
        let a = Hash::hash(b"alephium-a");
        let b = Hash::hash(b"alephium-b");
        assert_ne!(a, b);
    }

    #[test]
    fn block_hash_and_tx_id_are_distinct_types() {
        let h = Hash::hash(b"x");
        let bh = BlockHash::from(h);
        let tid = TxId::from(h);
        // Same underlying bytes, but the compiler enforces they cannot be
        // used interchangeably; here we just confirm the round-trip.
        assert_eq!(bh.hash(), tid.hash());
    }

    #[test]
    fn ordering_is_lexicographic_on_bytes() {
        let a = Hash([0u8; 32]);
        let mut b = [0u8; 32];
        b[31] = 1;
        let b = Hash(b);
        assert_eq!(block_hash_ordering(&a, &b), std::cmp::Ordering::Less);
    }
}
