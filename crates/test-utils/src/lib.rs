// Path: crates/test-utils/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Alephium Kernel Test Utilities
//!
//! Fixtures shared across this workspace's `#[cfg(test)]` modules and
//! integration tests: genesis block/chain builders, deterministic block
//! and transaction builders, and a seeded RNG for anything that needs
//! reproducible randomness rather than hand-picked byte literals.

/// Builds genesis blocks and an opened `BlockFlow` over them.
pub mod genesis;
/// Deterministic block and transaction builders.
pub mod builders;
/// A seeded RNG for reproducible tests.
pub mod rng;

pub use genesis::{genesis_block, genesis_flow};
pub use rng::TestRng;
