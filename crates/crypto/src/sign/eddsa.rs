// Path: crates/crypto/src/sign/eddsa.rs

//! Ed25519 signing and verification, backing the VM's `VerifyED25519`
//! opcode and any lockup script that names an Ed25519 key.

use crate::error::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// An Ed25519 key pair.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

/// An Ed25519 public key.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ed25519PublicKey(VerifyingKey);

/// An Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

impl Ed25519KeyPair {
    /// Generates a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Ed25519KeyPair { signing_key }
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key())
    }

    /// Signs `message`.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message))
    }
}

impl Ed25519PublicKey {
    /// Parses a 32-byte public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("expected 32 bytes".into()))?;
        VerifyingKey::from_bytes(&arr)
            .map(Ed25519PublicKey)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// The raw 32-byte encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Verifies `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CryptoError> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl Ed25519Signature {
    /// Parses a 64-byte signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature("expected 64 bytes".into()))?;
        Ok(Ed25519Signature(ed25519_dalek::Signature::from_bytes(&arr)))
    }

    /// The raw 64-byte encoding.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

/// Free-function form used by the VM's `VerifyED25519` opcode: verifies
/// `signature` over `data` under `public_key`, all as raw byte slices.
pub fn verify(public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let pk = Ed25519PublicKey::from_bytes(public_key)?;
    let sig = Ed25519Signature::from_bytes(signature)?;
    pk.verify(data, &sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let keypair = Ed25519KeyPair::generate();
        let message = b"alephium";
        let sig = keypair.sign(message);
        assert!(keypair.public_key().verify(message, &sig).is_ok());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let a = Ed25519KeyPair::generate();
        let b = Ed25519KeyPair::generate();
        let sig = a.sign(b"msg");
        assert!(b.public_key().verify(b"msg", &sig).is_err());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let keypair = Ed25519KeyPair::generate();
        let sig = keypair.sign(b"original");
        assert!(keypair.public_key().verify(b"tampered", &sig).is_err());
    }

    #[test]
    fn key_and_signature_round_trip_through_bytes() {
        let keypair = Ed25519KeyPair::generate();
        let pk_bytes = keypair.public_key().to_bytes();
        let sig = keypair.sign(b"m");
        let sig_bytes = sig.to_bytes();
        assert!(verify(&pk_bytes, b"m", &sig_bytes).is_ok());
    }
}
