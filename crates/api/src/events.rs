// Path: crates/api/src/events.rs

//! The typed event bus the core publishes to: `BlockNotify` on successful
//! block application, and VM `LogN` emissions. Consumers (RPC/WebSocket)
//! subscribe; delivery is best-effort (spec §6 "Events").

use alephium_types::{BlockHash, Hash};
use async_trait::async_trait;

/// Emitted once per successfully applied block.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlockNotify {
    /// The applied block's hash.
    pub block_hash: BlockHash,
    /// The block's height on its own chain.
    pub height: u64,
}

/// A `LogN` emission from VM script execution (`Log1..Log5`): up to 5
/// opaque topic values, reported verbatim with no interpretation by the
/// core.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ContractLog {
    /// The contract that emitted the log.
    pub contract_id: Hash,
    /// The transaction whose script execution produced the log.
    pub tx_id: Hash,
    /// The logged values, canonically encoded.
    pub topics: Vec<Vec<u8>>,
}

/// The sink the orchestrator and VM publish events to. The core makes no
/// assumption about delivery semantics beyond best-effort; an
/// implementation may drop events under backpressure rather than block the
/// single write loop.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publishes a `BlockNotify`.
    async fn block_notify(&self, notify: BlockNotify);

    /// Publishes a `LogN` emission.
    async fn log(&self, entry: ContractLog);
}

/// An `EventSink` that discards every event, used by tests and by
/// components that run the orchestrator without a subscriber attached.
#[derive(Default, Debug)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn block_notify(&self, _notify: BlockNotify) {}
    async fn log(&self, _entry: ContractLog) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_sink_accepts_events_without_panicking() {
        let sink = NullEventSink;
        sink.block_notify(BlockNotify {
            block_hash: BlockHash::from(Hash::hash(b"x")),
            height: 1,
        })
        .await;
        sink.log(ContractLog {
            contract_id: Hash::hash(b"c"),
            tx_id: Hash::hash(b"t"),
            topics: vec![],
        })
        .await;
    }
}
