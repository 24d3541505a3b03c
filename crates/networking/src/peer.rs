// Path: crates/networking/src/peer.rs

//! `PeerId`: an opaque, transport-assigned identifier for a remote node.
//! This crate never dials or accepts connections itself, so it has no
//! opinion on how a `PeerId` maps to an actual network address — a
//! transport (libp2p or otherwise) assigns these and passes them into the
//! [`crate::inbound::InboundHandler`] methods.

use std::fmt;

/// An opaque per-connection peer identifier, stable for the lifetime of a
/// transport-level session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PeerId(pub [u8; 32]);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
