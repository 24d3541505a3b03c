// Path: crates/state/src/contract.rs

//! Contract world-state records (spec §3 "Lifecycles", §4.4 "Contract
//! lifecycle").
//!
//! `fields` is stored pre-encoded (`parity-scale-codec` bytes of the VM's
//! `Val` vector) rather than as a typed `Vec<Val>`, so this crate never
//! depends on `alephium-vm` — the VM encodes/decodes fields through the
//! same codec when it loads or commits a contract's state.
//!
//! `Hash` and `TxOutputRef` carry the kernel's own deterministic `Codec`,
//! not `parity-scale-codec`'s `Encode`/`Decode` (those are reserved for
//! consensus-critical wire data, spec §6), so the internal encodings below
//! are written by hand rather than derived.

use alephium_types::codec::Codec;
use alephium_types::hash::Hash;
use alephium_types::transaction::TxOutputRef;
use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input, Output};

/// A contract's persisted identity: `hash(contractDeployTxId ‖
/// outputIndex)`, matching how the spec derives `TxOutputRef.key` for
/// contract outputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ContractId(pub Hash);

impl ContractId {
    /// Derives a contract id from its creating output reference.
    pub fn from_output_ref(output_ref: &TxOutputRef) -> Self {
        ContractId(output_ref.key)
    }
}

impl Encode for ContractId {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        dest.write(self.0.as_bytes());
    }
}

impl Decode for ContractId {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let mut bytes = [0u8; 32];
        input.read(&mut bytes)?;
        Ok(ContractId(Hash(bytes)))
    }
}

/// The full persisted state of one contract: its immutable code hash, its
/// mutable field vector (opaque bytes here), and the `TxOutputRef` of its
/// backing contract-asset output.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ContractState {
    /// Hash of the contract's bytecode, set at `CreateContract` time and
    /// never mutated afterwards.
    pub code_hash: Hash,
    /// `parity-scale-codec`-encoded `Vec<Val>`, opaque to this crate.
    pub fields: Vec<u8>,
    /// The contract's asset-bearing output reference, updated whenever
    /// the contract's ALF/token balances change.
    pub output_ref: TxOutputRef,
}

impl ContractState {
    /// Builds a freshly deployed contract's state.
    pub fn new(code_hash: Hash, fields: Vec<u8>, output_ref: TxOutputRef) -> Self {
        ContractState {
            code_hash,
            fields,
            output_ref,
        }
    }

    /// The trie key this contract is stored under.
    pub fn trie_key(&self, id: &ContractId) -> Hash {
        id.0
    }
}

impl Encode for ContractState {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        dest.write(self.code_hash.as_bytes());
        self.fields.encode_to(dest);
        self.output_ref.to_bytes().encode_to(dest);
    }
}

impl Decode for ContractState {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let mut code_hash_bytes = [0u8; 32];
        input.read(&mut code_hash_bytes)?;
        let fields = Vec::<u8>::decode(input)?;
        let output_ref_bytes = Vec::<u8>::decode(input)?;
        let output_ref = TxOutputRef::from_bytes(&output_ref_bytes)
            .map_err(|_| ScaleError::from("malformed TxOutputRef"))?;
        Ok(ContractState {
            code_hash: Hash(code_hash_bytes),
            fields,
            output_ref,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_types::hash::TxId;

    #[test]
    fn contract_id_derives_from_output_ref() {
        let tx_id = TxId::from(Hash::hash(b"deploy-tx"));
        let output_ref = TxOutputRef::contract(0, TxOutputRef::key_for(tx_id, 0));
        let id = ContractId::from_output_ref(&output_ref);
        assert_eq!(id.0, output_ref.key);
    }

    #[test]
    fn state_round_trips_through_codec() {
        let tx_id = TxId::from(Hash::hash(b"deploy-tx"));
        let output_ref = TxOutputRef::contract(0, TxOutputRef::key_for(tx_id, 0));
        let state = ContractState::new(Hash::hash(b"code"), vec![1, 2, 3], output_ref);
        let encoded = state.encode();
        let decoded = ContractState::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(state, decoded);
    }
}
