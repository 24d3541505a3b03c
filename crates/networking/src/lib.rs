// Path: crates/networking/src/lib.rs

//! The typed inbound P2P message interface (§6 "External interfaces"): a
//! message enum and the [`inbound::InboundHandler`] trait a transport calls
//! into as messages arrive. This crate deliberately does not dial peers,
//! open streams, or implement libp2p/QUIC/TCP framing — that is left to an
//! out-of-scope gossip transport, matching §1's "delivers blocks/tx to the
//! core via a typed inbound interface".

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// The interface a transport calls into as messages arrive.
pub mod inbound;
/// The typed message set and its wire encoding.
pub mod message;
/// Opaque transport-assigned peer identifiers.
pub mod peer;

pub use inbound::{InboundError, InboundHandler};
pub use message::{
    BlocksRequest, BlocksResponse, HeadersRequest, HeadersResponse, Hello, InvRequest, InvResponse, Message,
};
pub use peer::PeerId;
