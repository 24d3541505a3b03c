// Path: crates/crypto/src/error.rs

//! Local error type for the crypto crate.

/// A failure constructing a key, a signature, or verifying one.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    /// A key's raw bytes were the wrong length or otherwise malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// A signature's raw bytes were the wrong length or otherwise
    /// malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    /// A signature did not verify against the given key and message.
    #[error("signature verification failed")]
    VerificationFailed,
}
