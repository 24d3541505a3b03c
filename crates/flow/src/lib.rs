// Path: crates/flow/src/lib.rs

//! The per-chain store, the BlockFlow DAG engine, the conflict cache, and
//! the block validation pipeline (§4.1-§4.7) — the kernel's single-writer
//! consensus core.
//!
//! Mutation is single-writer throughout: every `&mut self` method here is
//! meant to be called only from the orchestrator's serialized message
//! loop (`alephium-orchestrator`), never concurrently. Readers (RPC, the
//! mempool) take immutable snapshots instead of locking.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// `BlockFlow`: the DAG engine tying every chain's flow tips together,
/// `calBestDeps`, and history locators for sync (§4.2).
pub mod blockflow;
/// `BlockHashChain`: the per-`(from, to)` header/body store, height index,
/// canonical chain, and tip set (§4.1).
pub mod chain;
/// `ConflictCache`: the bounded, time-windowed double-spend index (§4.3).
pub mod conflict;
/// The crate's error type.
pub mod error;
/// Block validation: header well-formedness, dependency resolution, the
/// coinbase reward equation, and per-tx validation (§4.6).
pub mod validation;

pub use blockflow::{sample_heights, BlockFlow, FlowTips};
pub use chain::BlockHashChain;
pub use conflict::ConflictCache;
pub use error::FlowError;
pub use validation::{validate_block, BlockValidationContext, RewardSchedule, ScriptDecoder};
