// Path: crates/node/src/identity.rs

//! Persists the genesis hash a data directory was first opened with, and
//! fails fast if a later run's configuration derives a different one.
//! Grounded in the teacher's `orchestration.rs`, which persists a
//! `chain_identity.json` on first boot and panics on mismatch rather than
//! silently running a node against the wrong chain's data.

use std::path::Path;

use alephium_types::error::IoError;
use alephium_types::Hash;
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

#[derive(Serialize, Deserialize)]
struct ChainIdentity {
    genesis_hash: String,
}

/// On first boot, persists `configured` as this data directory's chain
/// identity. On every subsequent boot, verifies the stored identity still
/// matches `configured`.
pub fn check_or_persist(path: &Path, configured: Hash) -> Result<(), NodeError> {
    if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|e| IoError::Backend(e.to_string()))?;
        let stored: ChainIdentity = serde_json::from_str(&text).map_err(|e| IoError::Codec(e.to_string()))?;
        let bytes = hex::decode(&stored.genesis_hash).map_err(|e| IoError::Codec(e.to_string()))?;
        let mut array = [0u8; 32];
        if bytes.len() != 32 {
            return Err(IoError::Codec("stored genesis hash is not 32 bytes".into()).into());
        }
        array.copy_from_slice(&bytes);
        let stored_hash = Hash(array);
        if stored_hash != configured {
            return Err(NodeError::ChainIdentityMismatch { stored: stored_hash, configured });
        }
        Ok(())
    } else {
        let identity = ChainIdentity { genesis_hash: hex::encode(configured.as_bytes()) };
        let text = serde_json::to_string_pretty(&identity).map_err(|e| IoError::Codec(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| IoError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_boot_persists_then_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain_identity.json");
        let hash = Hash::hash(b"genesis");
        check_or_persist(&path, hash).unwrap();
        assert!(check_or_persist(&path, hash).is_ok());
    }

    #[test]
    fn mismatched_identity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain_identity.json");
        check_or_persist(&path, Hash::hash(b"a")).unwrap();
        assert!(check_or_persist(&path, Hash::hash(b"b")).is_err());
    }
}
