// Path: crates/storage/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Alephium Kernel Storage
//!
//! A [`RedbStorage`] implementation of `alephium_api::storage::Storage`,
//! backed by `redb`, an embedded pure-Rust KV engine — the persistence
//! engine the teacher crate's own storage layer is built on.

/// `RedbStorage`, the `redb`-backed `Storage` implementation.
pub mod redb_store;

pub use redb_store::RedbStorage;
