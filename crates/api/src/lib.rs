// Path: crates/api/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Alephium Kernel API
//!
//! The trait seams the kernel is built against but does not itself
//! implement: [`storage::Storage`] (the on-disk column-family facade) and
//! [`events::EventSink`] (the typed event bus the core publishes
//! `BlockNotify`/`LogN` to). Persistence engines, RPC/WebSocket layers, and
//! metrics sinks are out of scope for this workspace; they are expected to
//! implement these traits.

/// `BlockNotify`/`LogN` event delivery, implemented by RPC/WebSocket
/// consumers.
pub mod events;
/// The `Storage` trait: column-family get/put/commit plus staging overlays.
pub mod storage;

pub use events::{BlockNotify, EventSink};
pub use storage::{ColumnFamily, Storage, StorageBatch};
