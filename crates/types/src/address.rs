// Path: crates/types/src/address.rs

//! `Address`: a base58-style display form of a [`LockupScript`], for
//! logging, config files, and client-facing APIs.
//!
//! This is a display/debug convenience only; it carries no consensus
//! semantics beyond those already owned by `LockupScript` itself.

use crate::codec::Codec;
use crate::output::LockupScript;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A human-displayable wrapper around a [`LockupScript`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Address(pub LockupScript);

/// Errors decoding an [`Address`] from its base58 text form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    /// The text was not valid base58.
    #[error("invalid base58 encoding")]
    InvalidBase58,
    /// The decoded bytes were not a well-formed `LockupScript`.
    #[error("malformed lockup script")]
    MalformedScript,
}

impl Address {
    /// Wraps a lockup script for display.
    pub fn new(lockup_script: LockupScript) -> Self {
        Address(lockup_script)
    }

    /// The wrapped lockup script.
    pub fn lockup_script(&self) -> &LockupScript {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0.to_bytes()).into_string())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58)?;
        let script =
            LockupScript::from_bytes(&bytes).map_err(|_| AddressError::MalformedScript)?;
        Ok(Address(script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Hash;

    #[test]
    fn address_round_trips_through_text() {
        let addr = Address::new(LockupScript::P2PKH(Hash::hash(b"pubkey")));
        let text = addr.to_string();
        let decoded: Address = text.parse().unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn garbage_text_is_rejected() {
        let result: Result<Address, _> = "not-valid-base58-!!!".parse();
        assert!(result.is_err());
    }
}
