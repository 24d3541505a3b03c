// Path: crates/crypto/src/sign/mod.rs

//! Per-algorithm signature submodules, one type family per scheme, mirroring
//! the per-algorithm layout used across the rest of the signing stack.

pub mod eddsa;
pub mod secp256k1;
