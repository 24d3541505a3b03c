// Path: crates/crypto/src/hash.rs

//! The hash functions exposed as VM crypto opcodes (`Blake2b`, `Keccak256`,
//! `Sha256`, `Sha3`). These operate on raw bytes and are distinct from
//! `alephium_types::hash::Hash`, which is the kernel's own
//! content-addressing function (also Blake2b-256, but kept in `alephium-types`
//! so that crate has no dependency on this one).

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as Blake2Digest};
use sha2::Sha256 as Sha256Impl;
use sha2::Digest as Sha2Digest;
use sha3::{Digest as Sha3Digest, Keccak256, Sha3_256};

/// `Blake2b-256(bytes)`.
pub fn blake2b(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    Blake2Digest::update(&mut hasher, bytes);
    let digest = Blake2Digest::finalize(hasher);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// `Keccak256(bytes)`.
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    Sha3Digest::update(&mut hasher, bytes);
    let digest = Sha3Digest::finalize(hasher);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// `Sha256(bytes)`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256Impl::new();
    Sha2Digest::update(&mut hasher, bytes);
    let digest = Sha2Digest::finalize(hasher);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// `Sha3-256(bytes)`.
pub fn sha3(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    Sha3Digest::update(&mut hasher, bytes);
    let digest = Sha3Digest::finalize(hasher);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_deterministic_and_distinct() {
        let input = b"alephium";
        assert_eq!(blake2b(input), blake2b(input));
        assert_ne!(blake2b(input), keccak256(input));
        assert_ne!(sha256(input), sha3(input));
    }
}
