// Path: crates/orchestrator/src/inbound.rs

//! [`OrchestratorInbound`]: the `alephium-networking::InboundHandler`
//! implementation a transport calls into, backed by an
//! [`crate::command::OrchestratorHandle`]. Bound to a single
//! [`ChainIndex`] per instance — nothing in the inbound message set
//! carries a chain coordinate, so a transport wanting to serve several
//! chains over one connection runs one `OrchestratorInbound` per chain
//! rather than this type routing by inspecting message contents.

use alephium_networking::inbound::{InboundError, InboundHandler};
use alephium_networking::message::{BlocksRequest, BlocksResponse, HeadersRequest, HeadersResponse, Hello, InvRequest, InvResponse};
use alephium_networking::peer::PeerId;
use alephium_types::{Block, BlockHeader, ChainIndex, Hash, Transaction};
use async_trait::async_trait;

use crate::command::OrchestratorHandle;

/// Adapts one [`OrchestratorHandle`] into the inbound interface a
/// transport drives, for the single chain `chain_index`.
pub struct OrchestratorInbound {
    handle: OrchestratorHandle,
    chain_index: ChainIndex,
    genesis_hash: Hash,
}

impl OrchestratorInbound {
    /// Builds an inbound handler serving `chain_index`, rejecting any peer
    /// whose handshake doesn't declare `genesis_hash`.
    pub fn new(handle: OrchestratorHandle, chain_index: ChainIndex, genesis_hash: Hash) -> Self {
        OrchestratorInbound { handle, chain_index, genesis_hash }
    }
}

#[async_trait]
impl InboundHandler for OrchestratorInbound {
    async fn on_hello(&self, peer: PeerId, hello: Hello) -> Result<(), InboundError> {
        if hello.genesis_hash != self.genesis_hash {
            return Err(InboundError::WrongNetwork(peer));
        }
        Ok(())
    }

    async fn on_ping(&self, _peer: PeerId, nonce: u64) -> u64 {
        nonce
    }

    async fn on_blocks_request(&self, peer: PeerId, request: BlocksRequest) -> Result<BlocksResponse, InboundError> {
        match self.handle.get_blocks(self.chain_index, request.locator_hashes, request.max_blocks).await {
            Ok(Ok(blocks)) => Ok(BlocksResponse { blocks }),
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, error = %e, "blocks request failed, answering empty");
                Ok(BlocksResponse { blocks: Vec::new() })
            }
            Err(_closed) => Ok(BlocksResponse { blocks: Vec::new() }),
        }
    }

    async fn on_headers_request(&self, peer: PeerId, request: HeadersRequest) -> Result<HeadersResponse, InboundError> {
        match self.handle.get_headers(self.chain_index, request.locator_hashes, request.max_headers).await {
            Ok(Ok(headers)) => Ok(HeadersResponse { headers }),
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, error = %e, "headers request failed, answering empty");
                Ok(HeadersResponse { headers: Vec::new() })
            }
            Err(_closed) => Ok(HeadersResponse { headers: Vec::new() }),
        }
    }

    async fn on_inv_request(&self, peer: PeerId, request: InvRequest) -> Result<InvResponse, InboundError> {
        match self.handle.get_inventory(self.chain_index, request.locator_hashes).await {
            Ok(Ok(hashes)) => Ok(InvResponse { hashes }),
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, error = %e, "inventory request failed, answering empty");
                Ok(InvResponse { hashes: Vec::new() })
            }
            Err(_closed) => Ok(InvResponse { hashes: Vec::new() }),
        }
    }

    async fn on_new_blocks(&self, peer: PeerId, blocks: Vec<Block>) {
        for block in blocks {
            if let Ok(Err(e)) = self.handle.add_block(self.chain_index, block).await {
                tracing::warn!(peer = %peer, error = %e, "rejected block from peer");
            }
        }
    }

    async fn on_new_headers(&self, peer: PeerId, headers: Vec<BlockHeader>) {
        tracing::debug!(peer = %peer, count = headers.len(), "ignoring bodiless header announcement");
    }

    async fn on_new_inv(&self, peer: PeerId, hashes: Vec<Hash>) {
        tracing::debug!(peer = %peer, count = hashes.len(), "ignoring inventory announcement, no pull-sync driver wired");
    }

    async fn on_new_txs(&self, peer: PeerId, txs: Vec<Transaction>) {
        for tx in txs {
            let _ = self.handle.add_tx(self.chain_index, tx).await;
        }
        tracing::debug!(peer = %peer, "admitted gossiped transactions");
    }
}
