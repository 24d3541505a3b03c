// Path: crates/types/src/transaction.rs

//! `Transaction`, `TxOutputRef`, and transaction identity.

use crate::codec::{Codec, CodecError, Reader, Writer};
use crate::hash::{Hash, TxId};
use crate::output::{Amount, TxOutput, UnlockScript};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A raw signature, opaque to this crate (verified by `alephium-tx` against
/// the algorithm named by the spending condition).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Signature(pub Vec<u8>);

impl Codec for Signature {
    fn encode_to(&self, w: &mut Writer) {
        w.write_bytes(&self.0);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Signature(r.read_bytes()?))
    }
}

/// `(hint: scriptHint xor assetBit, key: Hash)`. The hint's low bit
/// discriminates an `AssetOutputRef` (`1`) from a `ContractOutputRef`
/// (`0`); the remaining bits are the output lockup script's group hint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct TxOutputRef {
    /// `(scriptHint << 1) | assetBit`.
    pub hint: u32,
    /// `hash(txId ‖ outputIndex)` for both fixed and generated outputs.
    pub key: Hash,
}

impl TxOutputRef {
    /// Builds a reference to an asset output.
    pub fn asset(script_hint: u32, key: Hash) -> Self {
        TxOutputRef {
            hint: (script_hint << 1) | 1,
            key,
        }
    }

    /// Builds a reference to a contract output.
    pub fn contract(script_hint: u32, key: Hash) -> Self {
        TxOutputRef {
            hint: script_hint << 1,
            key,
        }
    }

    /// `true` iff this reference names an `AssetOutput`.
    pub fn is_asset(&self) -> bool {
        self.hint & 1 == 1
    }

    /// The group hint bits, with the asset/contract discriminator removed.
    pub fn script_hint(&self) -> u32 {
        self.hint >> 1
    }

    /// `hash(txId ‖ outputIndex)`, used as the `key` for both a fixed and a
    /// generated output at `index` within `tx_id`.
    pub fn key_for(tx_id: TxId, index: u32) -> Hash {
        Hash::hash_concat(tx_id.as_bytes(), &index.to_be_bytes())
    }
}

impl Codec for TxOutputRef {
    fn encode_to(&self, w: &mut Writer) {
        w.write_u32(self.hint);
        w.write_hash(&self.key);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let hint = r.read_u32()?;
        let key = r.read_hash()?;
        Ok(TxOutputRef { hint, key })
    }
}

/// A spend of a previous output: the reference being spent plus the witness
/// unlocking it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct TxInput {
    /// The output being spent.
    pub output_ref: TxOutputRef,
    /// The witness, whose variant must structurally match the referenced
    /// output's lockup script.
    pub unlock_script: UnlockScript,
}

impl Codec for TxInput {
    fn encode_to(&self, w: &mut Writer) {
        self.output_ref.encode_to(w);
        self.unlock_script.encode_to(w);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let output_ref = TxOutputRef::decode_from(r)?;
        let unlock_script = UnlockScript::decode_from(r)?;
        Ok(TxInput {
            output_ref,
            unlock_script,
        })
    }
}

/// The part of a transaction that is fixed at creation time and whose hash
/// is the transaction's identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct UnsignedTransaction {
    /// The UTXOs being spent.
    pub inputs: Vec<TxInput>,
    /// The outputs fixed at creation time (as opposed to
    /// `generatedOutputs`, which only exist after script execution).
    pub fixed_outputs: Vec<TxOutput>,
    /// The gas limit.
    pub gas_amount: u64,
    /// The gas price, in ALF per gas unit.
    pub gas_price: Amount,
    /// The optional tx script bytecode (opaque here; interpreted by
    /// `alephium-vm`).
    pub script: Option<Vec<u8>>,
}

impl Codec for UnsignedTransaction {
    fn encode_to(&self, w: &mut Writer) {
        w.write_seq(&self.inputs, |w, i| i.encode_to(w));
        w.write_seq(&self.fixed_outputs, |w, o| o.encode_to(w));
        w.write_u64(self.gas_amount);
        self.gas_price.encode_to(w);
        match &self.script {
            Some(bytes) => {
                w.write_u8(1);
                w.write_bytes(bytes);
            }
            None => {
                w.write_u8(0);
            }
        }
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let inputs = r.read_seq(|r| TxInput::decode_from(r))?;
        let fixed_outputs = r.read_seq(|r| TxOutput::decode_from(r))?;
        let gas_amount = r.read_u64()?;
        let gas_price = Amount::decode_from(r)?;
        let has_script = r.read_u8()?;
        let script = match has_script {
            0 => None,
            1 => Some(r.read_bytes()?),
            tag => return Err(CodecError::UnknownTag(tag)),
        };
        Ok(UnsignedTransaction {
            inputs,
            fixed_outputs,
            gas_amount,
            gas_price,
            script,
        })
    }
}

/// A full transaction: the fixed `unsigned` part, its witnesses, and the
/// fields only populated by script execution
/// (`contractInputs`/`generatedOutputs`, empty otherwise).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Transaction {
    /// The hashed, signed part of the transaction.
    pub unsigned: UnsignedTransaction,
    /// Contract-owned inputs consumed by script execution.
    pub contract_inputs: Vec<TxOutputRef>,
    /// Outputs produced by script execution (e.g. a contract's transfer).
    pub generated_outputs: Vec<TxOutput>,
    /// Signatures unlocking `unsigned.inputs`, in order.
    pub input_signatures: Vec<Signature>,
    /// Signatures consumed by in-script `VerifyTxSignature` calls, in
    /// order.
    pub contract_signatures: Vec<Signature>,
}

impl Transaction {
    /// `txId = hash(unsigned)`.
    pub fn id(&self) -> TxId {
        TxId::from(Hash::hash(&self.unsigned.to_bytes()))
    }

    /// All `TxOutputRef`s this transaction spends (its declared inputs;
    /// `contractInputs` are populated by execution and also count).
    pub fn spent_refs(&self) -> impl Iterator<Item = &TxOutputRef> {
        self.unsigned
            .inputs
            .iter()
            .map(|i| &i.output_ref)
            .chain(self.contract_inputs.iter())
    }

    /// `true` iff `self` and `other` share at least one spent
    /// `TxOutputRef` (the double-spend / conflict relation).
    pub fn conflicts_with(&self, other: &Transaction) -> bool {
        let mine: HashSet<&TxOutputRef> = self.spent_refs().collect();
        other.spent_refs().any(|r| mine.contains(r))
    }
}

impl Codec for Transaction {
    fn encode_to(&self, w: &mut Writer) {
        self.unsigned.encode_to(w);
        w.write_seq(&self.contract_inputs, |w, r| r.encode_to(w));
        w.write_seq(&self.generated_outputs, |w, o| o.encode_to(w));
        w.write_seq(&self.input_signatures, |w, s| s.encode_to(w));
        w.write_seq(&self.contract_signatures, |w, s| s.encode_to(w));
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let unsigned = UnsignedTransaction::decode_from(r)?;
        let contract_inputs = r.read_seq(|r| TxOutputRef::decode_from(r))?;
        let generated_outputs = r.read_seq(|r| TxOutput::decode_from(r))?;
        let input_signatures = r.read_seq(|r| Signature::decode_from(r))?;
        let contract_signatures = r.read_seq(|r| Signature::decode_from(r))?;
        Ok(Transaction {
            unsigned,
            contract_inputs,
            generated_outputs,
            input_signatures,
            contract_signatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{AssetOutput, LockupScript};

    fn sample_tx(seed: &[u8]) -> Transaction {
        let output_ref = TxOutputRef::asset(0, Hash::hash(seed));
        Transaction {
            unsigned: UnsignedTransaction {
                inputs: vec![TxInput {
                    output_ref,
                    unlock_script: UnlockScript::P2PKH(vec![1, 2, 3]),
                }],
                fixed_outputs: vec![TxOutput::Asset(AssetOutput {
                    amount: Amount::from_u64(10),
                    lockup_script: LockupScript::P2PKH(Hash::hash(b"dest")),
                    tokens: vec![],
                    lock_time: 0,
                    additional_data: vec![],
                })],
                gas_amount: 20_000,
                gas_price: Amount::from_u64(1),
                script: None,
            },
            contract_inputs: vec![],
            generated_outputs: vec![],
            input_signatures: vec![Signature(vec![9, 9, 9])],
            contract_signatures: vec![],
        }
    }

    #[test]
    fn tx_id_is_deterministic() {
        let a = sample_tx(b"seed");
        let b = sample_tx(b"seed");
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn different_inputs_different_id() {
        let a = sample_tx(b"seed-a");
        let b = sample_tx(b"seed-b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn shared_input_is_conflicted() {
        let a = sample_tx(b"shared");
        let mut b = sample_tx(b"shared");
        // Give b a distinct id-affecting field but keep the same input ref.
        b.unsigned.gas_amount = 30_000;
        assert!(a.conflicts_with(&b));
    }

    #[test]
    fn disjoint_inputs_not_conflicted() {
        let a = sample_tx(b"a");
        let b = sample_tx(b"b");
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn transaction_codec_round_trips() {
        let tx = sample_tx(b"codec");
        let bytes = tx.to_bytes();
        let decoded = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(tx, decoded);
    }
}
