// Path: crates/networking/src/message.rs

//! The typed inbound P2P message set (spec §6 "External interfaces"): every
//! message a gossip transport may deliver to the core, or the core may ask
//! a transport to publish. This crate defines the shapes and their wire
//! encoding only — dialing peers, framing streams, and request/response
//! correlation are a transport's job, not this crate's.

use alephium_types::codec::{Codec, CodecError, Reader, Writer};
use alephium_types::{Block, BlockHeader, Hash, Transaction};

/// A newly-connected peer's handshake: protocol version and the chain it
/// claims to be on, exchanged before any other message is accepted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Hello {
    /// The sending peer's protocol version.
    pub protocol_version: u32,
    /// The genesis hash of the chain the peer is following, used to reject
    /// peers on an incompatible network before exchanging any blocks.
    pub genesis_hash: Hash,
}

/// A request for full blocks starting just after the caller's locator
/// hashes (the same exponentially-thinned sample `sample_heights`
/// produces), capped at `max_blocks`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlocksRequest {
    /// Locator hashes, most recent first, used to find the common ancestor.
    pub locator_hashes: Vec<Hash>,
    /// The maximum number of blocks to return.
    pub max_blocks: u32,
}

/// The response to a [`BlocksRequest`]: zero or more full blocks, oldest
/// first, starting just after the common ancestor the locator resolved to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlocksResponse {
    /// The blocks returned, oldest first.
    pub blocks: Vec<Block>,
}

/// A request for headers only, otherwise identical to [`BlocksRequest`].
/// Used by a peer that wants to extend its header chain without paying for
/// full bodies (e.g. while validating a competing tip before fetching it).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HeadersRequest {
    /// Locator hashes, most recent first.
    pub locator_hashes: Vec<Hash>,
    /// The maximum number of headers to return.
    pub max_headers: u32,
}

/// The response to a [`HeadersRequest`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HeadersResponse {
    /// The headers returned, oldest first.
    pub headers: Vec<BlockHeader>,
}

/// A request for an inventory of block hashes known past the caller's
/// locator, without the headers or bodies themselves — used to decide what
/// to fetch next rather than to fetch it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InvRequest {
    /// Locator hashes, most recent first.
    pub locator_hashes: Vec<Hash>,
}

/// The response to an [`InvRequest`]: hashes only, oldest first.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InvResponse {
    /// The known hashes past the requested locator.
    pub hashes: Vec<Hash>,
}

/// Every message this crate's typed inbound interface accepts or emits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Message {
    /// Initial handshake.
    Hello(Hello),
    /// Liveness probe; the receiver must answer with `Pong` carrying the
    /// same nonce.
    Ping(u64),
    /// Answer to a `Ping`.
    Pong(u64),
    /// Pull-based block fetch.
    BlocksRequest(BlocksRequest),
    /// Answer to [`Message::BlocksRequest`].
    BlocksResponse(BlocksResponse),
    /// Pull-based header fetch.
    HeadersRequest(HeadersRequest),
    /// Answer to [`Message::HeadersRequest`].
    HeadersResponse(HeadersResponse),
    /// Pull-based inventory fetch.
    InvRequest(InvRequest),
    /// Answer to [`Message::InvRequest`].
    InvResponse(InvResponse),
    /// Push-based announcement of newly mined or received blocks.
    NewBlocks(Vec<Block>),
    /// Push-based announcement of newly seen headers (e.g. from a
    /// competing tip not yet fetched in full).
    NewHeaders(Vec<BlockHeader>),
    /// Push-based announcement of newly seen hashes, without bodies.
    NewInv(Vec<Hash>),
    /// Push-based announcement of newly seen mempool transactions.
    NewTxs(Vec<Transaction>),
}

fn write_hashes(w: &mut Writer, hashes: &[Hash]) {
    w.write_seq(hashes, |w, h| w.write_hash(h));
}

fn read_hashes(r: &mut Reader<'_>) -> Result<Vec<Hash>, CodecError> {
    r.read_seq(|r| r.read_hash())
}

impl Codec for Hello {
    fn encode_to(&self, w: &mut Writer) {
        w.write_u32(self.protocol_version);
        w.write_hash(&self.genesis_hash);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Hello {
            protocol_version: r.read_u32()?,
            genesis_hash: r.read_hash()?,
        })
    }
}

impl Codec for BlocksRequest {
    fn encode_to(&self, w: &mut Writer) {
        write_hashes(w, &self.locator_hashes);
        w.write_u32(self.max_blocks);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(BlocksRequest {
            locator_hashes: read_hashes(r)?,
            max_blocks: r.read_u32()?,
        })
    }
}

impl Codec for BlocksResponse {
    fn encode_to(&self, w: &mut Writer) {
        w.write_seq(&self.blocks, |w, b| b.encode_to(w));
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(BlocksResponse { blocks: r.read_seq(|r| Block::decode_from(r))? })
    }
}

impl Codec for HeadersRequest {
    fn encode_to(&self, w: &mut Writer) {
        write_hashes(w, &self.locator_hashes);
        w.write_u32(self.max_headers);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(HeadersRequest {
            locator_hashes: read_hashes(r)?,
            max_headers: r.read_u32()?,
        })
    }
}

impl Codec for HeadersResponse {
    fn encode_to(&self, w: &mut Writer) {
        w.write_seq(&self.headers, |w, h| h.encode_to(w));
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(HeadersResponse { headers: r.read_seq(|r| BlockHeader::decode_from(r))? })
    }
}

impl Codec for InvRequest {
    fn encode_to(&self, w: &mut Writer) {
        write_hashes(w, &self.locator_hashes);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(InvRequest { locator_hashes: read_hashes(r)? })
    }
}

impl Codec for InvResponse {
    fn encode_to(&self, w: &mut Writer) {
        write_hashes(w, &self.hashes);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(InvResponse { hashes: read_hashes(r)? })
    }
}

impl Codec for Message {
    fn encode_to(&self, w: &mut Writer) {
        match self {
            Message::Hello(m) => {
                w.write_u8(0);
                m.encode_to(w);
            }
            Message::Ping(nonce) => {
                w.write_u8(1);
                w.write_u64(*nonce);
            }
            Message::Pong(nonce) => {
                w.write_u8(2);
                w.write_u64(*nonce);
            }
            Message::BlocksRequest(m) => {
                w.write_u8(3);
                m.encode_to(w);
            }
            Message::BlocksResponse(m) => {
                w.write_u8(4);
                m.encode_to(w);
            }
            Message::HeadersRequest(m) => {
                w.write_u8(5);
                m.encode_to(w);
            }
            Message::HeadersResponse(m) => {
                w.write_u8(6);
                m.encode_to(w);
            }
            Message::InvRequest(m) => {
                w.write_u8(7);
                m.encode_to(w);
            }
            Message::InvResponse(m) => {
                w.write_u8(8);
                m.encode_to(w);
            }
            Message::NewBlocks(blocks) => {
                w.write_u8(9);
                w.write_seq(blocks, |w, b| b.encode_to(w));
            }
            Message::NewHeaders(headers) => {
                w.write_u8(10);
                w.write_seq(headers, |w, h| h.encode_to(w));
            }
            Message::NewInv(hashes) => {
                w.write_u8(11);
                write_hashes(w, hashes);
            }
            Message::NewTxs(txs) => {
                w.write_u8(12);
                w.write_seq(txs, |w, t| t.encode_to(w));
            }
        }
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            0 => Ok(Message::Hello(Hello::decode_from(r)?)),
            1 => Ok(Message::Ping(r.read_u64()?)),
            2 => Ok(Message::Pong(r.read_u64()?)),
            3 => Ok(Message::BlocksRequest(BlocksRequest::decode_from(r)?)),
            4 => Ok(Message::BlocksResponse(BlocksResponse::decode_from(r)?)),
            5 => Ok(Message::HeadersRequest(HeadersRequest::decode_from(r)?)),
            6 => Ok(Message::HeadersResponse(HeadersResponse::decode_from(r)?)),
            7 => Ok(Message::InvRequest(InvRequest::decode_from(r)?)),
            8 => Ok(Message::InvResponse(InvResponse::decode_from(r)?)),
            9 => Ok(Message::NewBlocks(r.read_seq(|r| Block::decode_from(r))?)),
            10 => Ok(Message::NewHeaders(r.read_seq(|r| BlockHeader::decode_from(r))?)),
            11 => Ok(Message::NewInv(read_hashes(r)?)),
            12 => Ok(Message::NewTxs(r.read_seq(|r| Transaction::decode_from(r))?)),
            tag => Err(CodecError::UnknownTag(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_round_trip_through_codec() {
        let msg = Message::Ping(42);
        let bytes = msg.to_bytes();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn new_inv_round_trips() {
        let msg = Message::NewInv(vec![Hash::hash(b"a"), Hash::hash(b"b")]);
        let bytes = msg.to_bytes();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = vec![255u8];
        assert!(Message::from_bytes(&bytes).is_err());
    }
}
