// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Alephium Kernel Types
//!
//! This crate is the foundational library for the Alephium BlockFlow kernel,
//! containing the core data model (hashes, groups, headers, transactions,
//! outputs, tokens), the deterministic wire/disk codec, configuration
//! structures, and the full error taxonomy.
//!
//! ## Architectural role
//!
//! As the base crate, `alephium-types` has minimal dependencies and is
//! itself a dependency for almost every other crate in the workspace. This
//! keeps the dependency graph acyclic and gives every component a single,
//! canonical definition of shared types like `Block`, `Transaction`, and the
//! error enums.

/// `Address`: a base58-style display form of a `LockupScript`.
pub mod address;
/// Hash/codec primitives: `Hash`, `BlockHash`, `TxId`, and the deterministic
/// binary codec described by the wire/disk format.
pub mod codec;
/// Immutable runtime configuration threaded through every component.
pub mod config;
/// `Block`: a header plus its transaction list, coinbase-last convention,
/// and the deterministic non-coinbase script execution order.
pub mod block;
/// A crate-wide `Result` alias is deliberately *not* provided here: callers
/// should use the specific error enum for their layer (`IoError`,
/// `InvalidBlockError`, `InvalidTxError`, `ExeFailure`) rather than a single
/// catch-all, matching the three-tier error design used throughout the
/// kernel.
pub mod error;
/// `GroupIndex` / `ChainIndex`: the sharding coordinates of the BlockFlow DAG.
pub mod group;
/// `Hash`, `BlockHash`, `TxId` and the raw hashing primitives used to derive
/// them.
pub mod hash;
/// `BlockHeader`, `Block`, `BlockDeps`, `Target`, and block weight.
pub mod header;
/// `LockupScript`, `UnlockScript`, `TxOutput` variants, and `Token`.
pub mod output;
/// A small prelude of extension traits used throughout the workspace.
pub mod prelude;
/// `Transaction`, `TxOutputRef`, and transaction identity.
pub mod transaction;

pub use address::Address;
pub use block::Block;
pub use group::{ChainIndex, GroupIndex};
pub use hash::{BlockHash, Hash, TxId};
pub use header::{BlockDeps, BlockHeader, Target, Weight};
pub use output::{AssetOutput, ContractOutput, LockupScript, Token, TokenId, TxOutput, UnlockScript};
pub use transaction::{Transaction, TxOutputRef, UnsignedTransaction};
