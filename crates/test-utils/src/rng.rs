// Path: crates/test-utils/src/rng.rs

//! A deterministically-seeded RNG, grounded in the teacher's own
//! `test_utils::randomness::TestRng` (a `StdRng` seeded from a `u64` so a
//! failing test can be reproduced from the seed alone).

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// A deterministic RNG for reproducible tests.
pub struct TestRng {
    rng: StdRng,
}

impl TestRng {
    /// Builds a `TestRng` from a `u64` seed.
    pub fn new(seed: u64) -> Self {
        let mut seed_bytes = [0u8; 32];
        seed_bytes[..8].copy_from_slice(&seed.to_le_bytes());
        TestRng { rng: StdRng::from_seed(seed_bytes) }
    }

    /// Fills `dest` with random bytes.
    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }

    /// A random 32-byte array, useful for building distinct `Hash` seeds.
    pub fn next_bytes32(&mut self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.fill_bytes(&mut bytes);
        bytes
    }

    /// A random `u64`.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

impl Default for TestRng {
    /// Seeds from a fixed constant, so two `TestRng::default()` calls in
    /// different test runs produce the same sequence.
    fn default() -> Self {
        TestRng::new(12345)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_sequence() {
        let mut a = TestRng::new(7);
        let mut b = TestRng::new(7);
        assert_eq!(a.next_u64(), b.next_u64());
        assert_eq!(a.next_bytes32(), b.next_bytes32());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = TestRng::new(1);
        let mut b = TestRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
