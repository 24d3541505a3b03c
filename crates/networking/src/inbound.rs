// Path: crates/networking/src/inbound.rs

//! [`InboundHandler`]: the interface a gossip transport calls into as
//! messages arrive. Modeled on the teacher's `BlockSync`/`MempoolGossip`
//! traits, but framed the other way around — those traits are what a core
//! calls *out* to a transport; this one is what a transport calls *in* to
//! the core (`alephium-orchestrator` implements it).

use async_trait::async_trait;
use thiserror::Error;

use crate::message::{BlocksRequest, BlocksResponse, Hello, HeadersRequest, HeadersResponse, InvRequest, InvResponse};
use crate::peer::PeerId;
use alephium_types::{Block, BlockHeader, Transaction};

/// An error raised while handling an inbound message.
#[derive(Debug, Error)]
pub enum InboundError {
    /// The peer's handshake declared an incompatible genesis hash.
    #[error("peer {0} is on an incompatible network")]
    WrongNetwork(PeerId),
    /// The peer is not known (no prior `Hello`) when a non-handshake
    /// message arrived.
    #[error("peer {0} sent a message before completing its handshake")]
    NotHandshaked(PeerId),
}

/// Everything the core accepts from a connected peer. A transport owns
/// connections and framing; it only ever calls these methods with already
/// length-delimited, already-decoded [`crate::message::Message`] payloads.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Processes a peer's handshake, accepting or rejecting the connection.
    async fn on_hello(&self, peer: PeerId, hello: Hello) -> Result<(), InboundError>;

    /// Answers a liveness probe; the transport is responsible for actually
    /// sending the returned nonce back as a `Pong`.
    async fn on_ping(&self, peer: PeerId, nonce: u64) -> u64;

    /// Serves a pull-based block fetch.
    async fn on_blocks_request(&self, peer: PeerId, request: BlocksRequest) -> Result<BlocksResponse, InboundError>;

    /// Serves a pull-based header fetch.
    async fn on_headers_request(&self, peer: PeerId, request: HeadersRequest) -> Result<HeadersResponse, InboundError>;

    /// Serves a pull-based inventory fetch.
    async fn on_inv_request(&self, peer: PeerId, request: InvRequest) -> Result<InvResponse, InboundError>;

    /// Admits blocks a peer announced unsolicited, routing each through
    /// block validation and the single-writer admission queue.
    async fn on_new_blocks(&self, peer: PeerId, blocks: Vec<Block>);

    /// Admits headers a peer announced unsolicited (without bodies).
    async fn on_new_headers(&self, peer: PeerId, headers: Vec<BlockHeader>);

    /// Records hashes a peer announced as known, used to decide what to
    /// pull next rather than to admit directly.
    async fn on_new_inv(&self, peer: PeerId, hashes: Vec<alephium_types::Hash>);

    /// Admits transactions a peer gossiped into the mempool.
    async fn on_new_txs(&self, peer: PeerId, txs: Vec<Transaction>);
}
