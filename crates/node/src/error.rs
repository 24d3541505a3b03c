// Path: crates/node/src/error.rs

//! [`NodeError`]: everything that can fail while starting the process,
//! before the orchestrator's own `run()` loop takes over.

use alephium_flow::error::FlowError;
use alephium_types::config::ConfigError;
use alephium_types::error::IoError;
use alephium_types::Hash;
use thiserror::Error;

/// Top-level startup error.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Opening storage or building genesis chains failed.
    #[error(transparent)]
    Flow(#[from] FlowError),
    /// Reading or writing a data-directory file (keypair, chain identity)
    /// failed.
    #[error(transparent)]
    Io(#[from] IoError),
    /// The data directory's stored genesis hash doesn't match the one this
    /// configuration derives, meaning the data directory belongs to a
    /// different chain.
    #[error("chain identity mismatch: data directory has genesis {stored}, configuration derives {configured}")]
    ChainIdentityMismatch {
        /// The hash recorded the first time this data directory was used.
        stored: Hash,
        /// The hash this run's configuration derives.
        configured: Hash,
    },
}
