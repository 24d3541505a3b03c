// Path: crates/tx/src/witness.rs

//! `checkWitnesses` (spec §4.5): verifies each input's unlock script
//! against its resolved pre-output's lockup script, consuming signatures
//! from a stack in input order.
//!
//! P2PKH/P2MPKH signatures are checked with secp256k1 — the scheme the
//! original Alephium wallet uses for ordinary UTXO keys, distinct from the
//! VM's generic `VerifySecP256K1`/`VerifyED25519` crypto opcodes which a
//! contract script can invoke for either scheme.

use alephium_crypto::hash::blake2b;
use alephium_crypto::sign::secp256k1;
use alephium_types::error::{InvalidTxError, TxKind};
use alephium_types::hash::{Hash, TxId};
use alephium_types::output::LockupScript;
use alephium_types::transaction::{Signature, Transaction};

/// Verifies every input's witness against its resolved pre-output lockup
/// script. `pre_output_locks[i]` must correspond to `tx.unsigned.inputs[i]`.
pub fn check_witnesses(
    tx: &Transaction,
    pre_output_locks: &[LockupScript],
) -> Result<(), InvalidTxError> {
    if pre_output_locks.len() != tx.unsigned.inputs.len() {
        return Err(InvalidTxError::new(TxKind::NonExistInput));
    }
    let tx_id = tx.id();
    let mut signatures = tx.input_signatures.iter();

    for (input, lockup) in tx.unsigned.inputs.iter().zip(pre_output_locks.iter()) {
        if !input.unlock_script.matches_lockup(lockup) {
            return Err(InvalidTxError::new(TxKind::InvalidUnlockScriptType));
        }
        match (lockup, &input.unlock_script) {
            (LockupScript::P2PKH(pk_hash), alephium_types::output::UnlockScript::P2PKH(pk)) => {
                check_p2pkh(pk_hash, pk, &tx_id, &mut signatures)?;
            }
            (LockupScript::P2MPKH(pk_hashes, m), alephium_types::output::UnlockScript::P2MPKH(indexed)) => {
                check_p2mpkh(pk_hashes, *m, indexed, &tx_id, &mut signatures)?;
            }
            (LockupScript::P2SH(script_hash), alephium_types::output::UnlockScript::P2SH(script, _params)) => {
                check_p2sh(script_hash, script)?;
            }
            (LockupScript::P2C(_), _) => {
                // Contract-owned inputs are unlocked by script execution,
                // not a user-supplied witness; nothing to check here.
            }
            _ => return Err(InvalidTxError::new(TxKind::InvalidUnlockScriptType)),
        }
    }

    if signatures.next().is_some() {
        return Err(InvalidTxError::new(TxKind::TooManySignatures));
    }
    Ok(())
}

fn next_signature<'a>(
    signatures: &mut impl Iterator<Item = &'a Signature>,
) -> Result<&'a Signature, InvalidTxError> {
    signatures.next().ok_or_else(|| InvalidTxError::new(TxKind::NotEnoughSignature))
}

fn check_p2pkh<'a>(
    pk_hash: &Hash,
    pk: &[u8],
    tx_id: &TxId,
    signatures: &mut impl Iterator<Item = &'a Signature>,
) -> Result<(), InvalidTxError> {
    if blake2b(pk) != pk_hash.0 {
        return Err(InvalidTxError::new(TxKind::InvalidPublicKeyHash));
    }
    let signature = next_signature(signatures)?;
    secp256k1::verify(pk, tx_id.as_bytes(), &signature.0)
        .map_err(|_| InvalidTxError::new(TxKind::InvalidSignature))
}

fn check_p2mpkh<'a>(
    pk_hashes: &[Hash],
    m: u8,
    indexed: &[(u32, Vec<u8>)],
    tx_id: &TxId,
    signatures: &mut impl Iterator<Item = &'a Signature>,
) -> Result<(), InvalidTxError> {
    if indexed.len() != m as usize {
        return Err(InvalidTxError::new(TxKind::NotEnoughSignature));
    }
    for (index, pk) in indexed {
        let expected = pk_hashes
            .get(*index as usize)
            .ok_or_else(|| InvalidTxError::new(TxKind::InvalidPublicKeyHash))?;
        if blake2b(pk) != expected.0 {
            return Err(InvalidTxError::new(TxKind::InvalidPublicKeyHash));
        }
        let signature = next_signature(signatures)?;
        secp256k1::verify(pk, tx_id.as_bytes(), &signature.0)
            .map_err(|_| InvalidTxError::new(TxKind::InvalidSignature))?;
    }
    Ok(())
}

fn check_p2sh(script_hash: &Hash, script: &[u8]) -> Result<(), InvalidTxError> {
    if blake2b(script) != script_hash.0 {
        return Err(InvalidTxError::new(TxKind::InvalidScriptHash));
    }
    // Running the unlocked script as a stateless asset script is the VM's
    // job (`alephium-vm::runAssetScript`); here we only check the hash
    // binding the witness to the lockup condition.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_crypto::sign::secp256k1::Secp256k1KeyPair;
    use alephium_types::hash::TxId;
    use alephium_types::output::{AssetOutput, Amount, TxOutputRef, UnlockScript};
    use alephium_types::transaction::{TxInput, UnsignedTransaction};

    fn sample_tx_with_input(unlock: UnlockScript) -> (Transaction, TxId) {
        let prev_tx_id = TxId::from(Hash::hash(b"prev"));
        let input = TxInput {
            output_ref: TxOutputRef::asset(0, TxOutputRef::key_for(prev_tx_id, 0)),
            unlock_script: unlock,
        };
        let tx = Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![input],
                fixed_outputs: vec![alephium_types::output::TxOutput::Asset(AssetOutput {
                    amount: Amount::from_u64(1_000_000_000_000_000_000),
                    lockup_script: LockupScript::P2PKH(Hash::hash(b"dest")),
                    tokens: vec![],
                    lock_time: 0,
                    additional_data: vec![],
                })],
                gas_amount: 20_000,
                gas_price: Amount::from_u64(100),
                script: None,
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![],
            contract_signatures: vec![],
        };
        let tx_id = tx.id();
        (tx, tx_id)
    }

    #[test]
    fn p2pkh_valid_signature_passes() {
        let keypair = Secp256k1KeyPair::generate();
        let pk_bytes = keypair.public_key().to_bytes().to_vec();
        let (mut tx, tx_id) = sample_tx_with_input(UnlockScript::P2PKH(pk_bytes.clone()));
        let signature = keypair.sign(tx_id.as_bytes()).unwrap();
        tx.input_signatures.push(Signature(signature.to_compact().to_vec()));
        let pk_hash = Hash::hash(&pk_bytes);
        let result = check_witnesses(&tx, &[LockupScript::P2PKH(pk_hash)]);
        assert!(result.is_ok());
    }

    #[test]
    fn p2pkh_wrong_pubkey_hash_is_rejected() {
        let keypair = Secp256k1KeyPair::generate();
        let pk_bytes = keypair.public_key().to_bytes().to_vec();
        let (mut tx, tx_id) = sample_tx_with_input(UnlockScript::P2PKH(pk_bytes));
        let signature = keypair.sign(tx_id.as_bytes()).unwrap();
        tx.input_signatures.push(Signature(signature.to_compact().to_vec()));
        let err = check_witnesses(&tx, &[LockupScript::P2PKH(Hash::hash(b"not-the-key"))]).unwrap_err();
        assert_eq!(err.kind, TxKind::InvalidPublicKeyHash);
    }

    #[test]
    fn missing_signature_is_rejected() {
        let keypair = Secp256k1KeyPair::generate();
        let pk_bytes = keypair.public_key().to_bytes().to_vec();
        let (tx, _tx_id) = sample_tx_with_input(UnlockScript::P2PKH(pk_bytes.clone()));
        let pk_hash = Hash::hash(&pk_bytes);
        let err = check_witnesses(&tx, &[LockupScript::P2PKH(pk_hash)]).unwrap_err();
        assert_eq!(err.kind, TxKind::NotEnoughSignature);
    }

    #[test]
    fn p2sh_hash_mismatch_is_rejected() {
        let (tx, _) = sample_tx_with_input(UnlockScript::P2SH(vec![1, 2, 3], vec![]));
        let err = check_witnesses(&tx, &[LockupScript::P2SH(Hash::hash(b"other"))]).unwrap_err();
        assert_eq!(err.kind, TxKind::InvalidScriptHash);
    }
}
