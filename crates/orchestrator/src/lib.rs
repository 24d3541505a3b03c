// Path: crates/orchestrator/src/lib.rs

//! The single-writer admission loop tying the `alephium-flow` consensus
//! core, the mempool, and `MissingDeps` parking together behind one
//! `mpsc`-backed command queue (§4.7 "Orchestration"). Every mutation to
//! `BlockFlow` happens inside [`orchestrator::Orchestrator::run`]; every
//! other component (networking, RPC) only ever holds an
//! [`command::OrchestratorHandle`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// The command enum and the cheap-clone handle used to submit work.
pub mod command;
/// A bounded, TTL-evicting per-chain transaction pool.
pub mod mempool;
/// Parking for blocks rejected with `MissingDeps`.
pub mod pending;
/// The `Orchestrator` struct and its single-writer loop.
pub mod orchestrator;
/// The `InboundHandler` implementation transports drive.
pub mod inbound;

pub use command::{Command, OrchestratorClosed, OrchestratorHandle};
pub use inbound::OrchestratorInbound;
pub use mempool::{AddResult, Mempool};
pub use orchestrator::Orchestrator;
pub use pending::PendingPool;
