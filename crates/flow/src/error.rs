// Path: crates/flow/src/error.rs

//! Errors surfaced by the per-chain store, the BlockFlow engine, and block
//! validation.

use alephium_types::error::{InvalidBlockError, InvalidTxError, IoError};
use alephium_types::Hash;
use thiserror::Error;

/// Top-level error for everything in this crate.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Storage access failed.
    #[error(transparent)]
    Io(#[from] IoError),
    /// A block or header failed structural or PoW validation.
    #[error(transparent)]
    InvalidBlock(#[from] InvalidBlockError),
    /// A transaction inside an otherwise well-formed block failed validation.
    #[error(transparent)]
    InvalidTx(#[from] InvalidTxError),
    /// `chain(index)` was called with a `ChainIndex` this BlockFlow instance
    /// doesn't track (out of `num_groups` range).
    #[error("unknown chain index {from}->{to}")]
    UnknownChain {
        /// The `from` group.
        from: u16,
        /// The `to` group.
        to: u16,
    },
    /// A hash was looked up in a chain that doesn't contain it.
    #[error("unknown hash {0}")]
    UnknownHash(Hash),
    /// `getBlockHashesBetween` (or an equivalent ancestor walk) was asked for
    /// a pair of hashes where the second is not an ancestor of the first.
    #[error("{descendant} is not a descendant of {ancestor}")]
    NotAncestor {
        /// The presumed ancestor.
        ancestor: Hash,
        /// The hash that turned out not to descend from it.
        descendant: Hash,
    },
}
