// Path: crates/state/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Alephium Kernel World State
//!
//! The contract world-state: a Merkle-Patricia trie ([`trie::Trie`]) of
//! [`contract::ContractState`] records, a per-block [`pool::ContractPool`]
//! cache, and a [`trie::StagingOverlay`] through which block application
//! reads and writes tentative state before folding it into the parent on
//! success (spec §4.4 "Context").

/// Contract identity and persisted state.
pub mod contract;
/// The per-block loaded-contract cache.
pub mod pool;
/// The Merkle-Patricia trie and its staging overlay.
pub mod trie;

pub use contract::{ContractId, ContractState};
pub use pool::ContractPool;
pub use trie::{StagingOverlay, Trie, TrieError};
