// Path: crates/orchestrator/src/command.rs

//! The single-writer command queue: every mutation to `BlockFlow` state
//! goes through one `mpsc` channel into [`crate::orchestrator::Orchestrator::run`],
//! so no two tasks ever validate or apply a block concurrently. Mirrors the
//! teacher's channel-plus-oneshot-reply worker pattern used throughout
//! `orchestration::context`/`events`.

use alephium_flow::error::FlowError;
use alephium_types::{Block, BlockHeader, ChainIndex, Hash, Transaction};
use tokio::sync::{mpsc, oneshot};

use crate::mempool::AddResult;

/// A unit of work submitted to the orchestrator's single-writer loop.
pub enum Command {
    /// Validates and, on success, applies `block` to `chain_index`.
    AddBlock {
        /// The chain the block claims to belong to.
        chain_index: ChainIndex,
        /// The block to validate and apply.
        block: Block,
        /// The validation/application outcome.
        reply: oneshot::Sender<Result<(), FlowError>>,
    },
    /// Admits `tx` into the mempool for `chain_index`.
    AddTx {
        /// The chain the transaction belongs to.
        chain_index: ChainIndex,
        /// The transaction to admit.
        tx: Transaction,
        /// The admission outcome.
        reply: oneshot::Sender<AddResult>,
    },
    /// Builds a locator (sampled ancestor hashes) for `chain_index`'s
    /// current canonical tip, used to start a sync pull.
    GetLocators {
        /// The chain to sample.
        chain_index: ChainIndex,
        /// The sampled hashes, most recent first.
        reply: oneshot::Sender<Result<Vec<Hash>, FlowError>>,
    },
    /// Resolves a peer-supplied locator to the hashes known past it, for a
    /// peer's `InvRequest`.
    GetInventory {
        /// The chain being queried.
        chain_index: ChainIndex,
        /// The peer's locator hashes, most recent first.
        locator_hashes: Vec<Hash>,
        /// The hashes known past the common ancestor, oldest first.
        reply: oneshot::Sender<Result<Vec<Hash>, FlowError>>,
    },
    /// Serves a peer's pull-based header fetch.
    GetHeaders {
        /// The chain being queried.
        chain_index: ChainIndex,
        /// The peer's locator hashes, most recent first.
        locator_hashes: Vec<Hash>,
        /// The maximum number of headers to return.
        max_headers: u32,
        /// The headers found past the common ancestor, oldest first.
        reply: oneshot::Sender<Result<Vec<BlockHeader>, FlowError>>,
    },
    /// Serves a peer's pull-based full-block fetch.
    GetBlocks {
        /// The chain being queried.
        chain_index: ChainIndex,
        /// The peer's locator hashes, most recent first.
        locator_hashes: Vec<Hash>,
        /// The maximum number of blocks to return.
        max_blocks: u32,
        /// The blocks found past the common ancestor, oldest first.
        reply: oneshot::Sender<Result<Vec<Block>, FlowError>>,
    },
}

/// A cheaply-cloneable handle to the orchestrator's command queue. Every
/// method sends a [`Command`] and awaits its reply; callers never touch
/// `BlockFlow` directly.
#[derive(Clone)]
pub struct OrchestratorHandle {
    sender: mpsc::Sender<Command>,
}

/// The error returned when the orchestrator's loop has shut down and no
/// reply will ever arrive.
#[derive(Debug, thiserror::Error)]
#[error("orchestrator loop is no longer running")]
pub struct OrchestratorClosed;

impl OrchestratorHandle {
    /// Wraps a raw command sender.
    pub fn new(sender: mpsc::Sender<Command>) -> Self {
        OrchestratorHandle { sender }
    }

    /// Submits a block for validation and application, awaiting the result.
    pub async fn add_block(&self, chain_index: ChainIndex, block: Block) -> Result<Result<(), FlowError>, OrchestratorClosed> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::AddBlock { chain_index, block, reply })
            .await
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }

    /// Submits a transaction for mempool admission, awaiting the result.
    pub async fn add_tx(&self, chain_index: ChainIndex, tx: Transaction) -> Result<AddResult, OrchestratorClosed> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::AddTx { chain_index, tx, reply })
            .await
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }

    /// Fetches a sync locator for `chain_index`.
    pub async fn get_locators(&self, chain_index: ChainIndex) -> Result<Result<Vec<Hash>, FlowError>, OrchestratorClosed> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::GetLocators { chain_index, reply })
            .await
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }

    /// Resolves a peer's locator to the inventory known past it.
    pub async fn get_inventory(
        &self,
        chain_index: ChainIndex,
        locator_hashes: Vec<Hash>,
    ) -> Result<Result<Vec<Hash>, FlowError>, OrchestratorClosed> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::GetInventory { chain_index, locator_hashes, reply })
            .await
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }

    /// Serves a peer's header fetch.
    pub async fn get_headers(
        &self,
        chain_index: ChainIndex,
        locator_hashes: Vec<Hash>,
        max_headers: u32,
    ) -> Result<Result<Vec<BlockHeader>, FlowError>, OrchestratorClosed> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::GetHeaders { chain_index, locator_hashes, max_headers, reply })
            .await
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }

    /// Serves a peer's full-block fetch.
    pub async fn get_blocks(
        &self,
        chain_index: ChainIndex,
        locator_hashes: Vec<Hash>,
        max_blocks: u32,
    ) -> Result<Result<Vec<Block>, FlowError>, OrchestratorClosed> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::GetBlocks { chain_index, locator_hashes, max_blocks, reply })
            .await
            .map_err(|_| OrchestratorClosed)?;
        rx.await.map_err(|_| OrchestratorClosed)
    }
}
