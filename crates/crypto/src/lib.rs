// Path: crates/crypto/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Alephium Kernel Crypto
//!
//! Hash functions and signature schemes backing the VM's crypto opcodes
//! (`Blake2b`/`Keccak256`/`Sha256`/`Sha3`/`VerifyTxSignature`/
//! `VerifySecP256K1`/`VerifyED25519`) and the kernel's lockup-script
//! witness checks.

/// The local error type for this crate.
pub mod error;
/// Raw hash functions (`blake2b`, `keccak256`, `sha256`, `sha3`).
pub mod hash;
/// Per-algorithm signature submodules (`eddsa`, `secp256k1`).
pub mod sign;

pub use error::CryptoError;
