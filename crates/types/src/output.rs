// Path: crates/types/src/output.rs

//! `LockupScript`, `UnlockScript`, `TxOutput` variants, and `Token`.

use crate::codec::{Codec, CodecError, Reader, Writer};
use crate::hash::Hash;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// A 256-bit unsigned amount, used for both ALF balances and token
/// balances. Canonically encoded as a fixed 32-byte big-endian integer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Debug, Default)]
pub struct Amount(pub BigUint);

impl Amount {
    /// The zero amount.
    pub fn zero() -> Self {
        Amount(BigUint::zero())
    }

    /// Builds an `Amount` from a `u64`, the common case for tests and
    /// configuration literals.
    pub fn from_u64(v: u64) -> Self {
        Amount(BigUint::from(v))
    }

    /// `true` iff the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition; `None` on overflow past 256 bits.
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        let sum = &self.0 + &other.0;
        if sum.bits() > 256 {
            None
        } else {
            Some(Amount(sum))
        }
    }

    /// Checked subtraction; `None` if `self < other`.
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }
}

impl Codec for Amount {
    fn encode_to(&self, w: &mut Writer) {
        let bytes = self.0.to_bytes_be();
        let mut fixed = [0u8; 32];
        // `bytes.len() <= 32` is an invariant maintained by `checked_add`
        // rejecting anything that would overflow 256 bits.
        fixed[32 - bytes.len()..].copy_from_slice(&bytes);
        w.write_array(&fixed);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let bytes = r.read_array::<32>()?;
        Ok(Amount(BigUint::from_bytes_be(&bytes)))
    }
}

/// The sanity ceiling placed on `gasPrice` and similar single-value ALF
/// amounts: half of the 256-bit range, leaving headroom under `Amount`'s
/// hard 256-bit limit for sums of several such values.
pub fn max_alf_value() -> Amount {
    Amount(BigUint::from(1u8) << 255u32)
}

/// `TokenId = Hash`. A new token's id equals its issuing contract id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug)]
pub struct TokenId(pub Hash);

impl Codec for TokenId {
    fn encode_to(&self, w: &mut Writer) {
        self.0.encode_to(w);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(TokenId(Hash::decode_from(r)?))
    }
}

/// A `(TokenId, Amount)` pair inside an output's token list.
pub type Token = (TokenId, Amount);

/// An output's spending condition.
///
/// `lockupScript.groupIndex` is `hash(lockupScript).xorByte mod G`, binding
/// an address to a shard.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum LockupScript {
    /// Pay to public-key hash: spendable by a single signature matching
    /// `pkHash`.
    P2PKH(Hash),
    /// Pay to multi-public-key hash: an `m`-of-`n` threshold over the given
    /// public-key hashes.
    P2MPKH(Vec<Hash>, u8),
    /// Pay to script hash: spendable by providing a script matching
    /// `scriptHash` plus its parameters.
    P2SH(Hash),
    /// Pay to contract: a contract's own asset output.
    P2C(Hash),
}

impl LockupScript {
    /// `hash(lockupScript).xorByte mod G`.
    pub fn group_index(&self, num_groups: u16) -> u16 {
        let h = Hash::hash(&self.to_bytes());
        (h.xor_byte() as u16) % num_groups
    }
}

impl Codec for LockupScript {
    fn encode_to(&self, w: &mut Writer) {
        match self {
            LockupScript::P2PKH(h) => {
                w.write_u8(0);
                w.write_hash(h);
            }
            LockupScript::P2MPKH(hashes, m) => {
                w.write_u8(1);
                w.write_seq(hashes, |w, h| w.write_hash(h));
                w.write_u8(*m);
            }
            LockupScript::P2SH(h) => {
                w.write_u8(2);
                w.write_hash(h);
            }
            LockupScript::P2C(h) => {
                w.write_u8(3);
                w.write_hash(h);
            }
        }
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            0 => Ok(LockupScript::P2PKH(r.read_hash()?)),
            1 => {
                let hashes = r.read_seq(|r| r.read_hash())?;
                let m = r.read_u8()?;
                Ok(LockupScript::P2MPKH(hashes, m))
            }
            2 => Ok(LockupScript::P2SH(r.read_hash()?)),
            3 => Ok(LockupScript::P2C(r.read_hash()?)),
            tag => Err(CodecError::UnknownTag(tag)),
        }
    }
}

/// The witness structurally matching a [`LockupScript`] variant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum UnlockScript {
    /// A single raw public key, checked against a `P2PKH` lockup.
    P2PKH(Vec<u8>),
    /// `(index, publicKey)` pairs, checked against a `P2MPKH` lockup.
    P2MPKH(Vec<(u32, Vec<u8>)>),
    /// A raw script plus its call parameters, checked against a `P2SH`
    /// lockup.
    P2SH(Vec<u8>, Vec<Vec<u8>>),
}

impl UnlockScript {
    /// `true` iff this unlock variant structurally matches `lockup`'s
    /// variant (the actual cryptographic/hash checks happen in
    /// `alephium-tx`).
    pub fn matches_lockup(&self, lockup: &LockupScript) -> bool {
        matches!(
            (self, lockup),
            (UnlockScript::P2PKH(_), LockupScript::P2PKH(_))
                | (UnlockScript::P2MPKH(_), LockupScript::P2MPKH(_, _))
                | (UnlockScript::P2SH(_, _), LockupScript::P2SH(_))
        )
    }
}

impl Codec for UnlockScript {
    fn encode_to(&self, w: &mut Writer) {
        match self {
            UnlockScript::P2PKH(pk) => {
                w.write_u8(0);
                w.write_bytes(pk);
            }
            UnlockScript::P2MPKH(pairs) => {
                w.write_u8(1);
                w.write_seq(pairs, |w, (idx, pk)| {
                    w.write_u32(*idx);
                    w.write_bytes(pk);
                });
            }
            UnlockScript::P2SH(script, params) => {
                w.write_u8(2);
                w.write_bytes(script);
                w.write_seq(params, |w, p| w.write_bytes(p));
            }
        }
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            0 => Ok(UnlockScript::P2PKH(r.read_bytes()?)),
            1 => {
                let pairs = r.read_seq(|r| {
                    let idx = r.read_u32()?;
                    let pk = r.read_bytes()?;
                    Ok((idx, pk))
                })?;
                Ok(UnlockScript::P2MPKH(pairs))
            }
            2 => {
                let script = r.read_bytes()?;
                let params = r.read_seq(|r| r.read_bytes())?;
                Ok(UnlockScript::P2SH(script, params))
            }
            tag => Err(CodecError::UnknownTag(tag)),
        }
    }
}

fn encode_tokens(w: &mut Writer, tokens: &[Token]) {
    w.write_seq(tokens, |w, (id, amount)| {
        id.encode_to(w);
        amount.encode_to(w);
    });
}

fn decode_tokens(r: &mut Reader<'_>) -> Result<Vec<Token>, CodecError> {
    r.read_seq(|r| {
        let id = TokenId::decode_from(r)?;
        let amount = Amount::decode_from(r)?;
        Ok((id, amount))
    })
}

/// A spendable UTXO locked by an ordinary lockup script.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct AssetOutput {
    /// The ALF amount.
    pub amount: Amount,
    /// The spending condition.
    pub lockup_script: LockupScript,
    /// A sorted list of `(TokenId, Amount)` pairs with nonzero amounts.
    pub tokens: Vec<Token>,
    /// The output is unspendable while `blockTimeStamp < lock_time`.
    pub lock_time: u64,
    /// Opaque application data (e.g. a memo).
    pub additional_data: Vec<u8>,
}

impl Codec for AssetOutput {
    fn encode_to(&self, w: &mut Writer) {
        self.amount.encode_to(w);
        self.lockup_script.encode_to(w);
        encode_tokens(w, &self.tokens);
        w.write_u64(self.lock_time);
        w.write_bytes(&self.additional_data);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let amount = Amount::decode_from(r)?;
        let lockup_script = LockupScript::decode_from(r)?;
        let tokens = decode_tokens(r)?;
        let lock_time = r.read_u64()?;
        let additional_data = r.read_bytes()?;
        Ok(AssetOutput {
            amount,
            lockup_script,
            tokens,
            lock_time,
            additional_data,
        })
    }
}

/// A UTXO owned by a contract; created/mutated only by contract execution.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ContractOutput {
    /// The ALF amount held by the contract.
    pub amount: Amount,
    /// Normally a `P2C` lockup for the owning contract.
    pub lockup_script: LockupScript,
    /// A sorted list of `(TokenId, Amount)` pairs with nonzero amounts.
    pub tokens: Vec<Token>,
}

impl Codec for ContractOutput {
    fn encode_to(&self, w: &mut Writer) {
        self.amount.encode_to(w);
        self.lockup_script.encode_to(w);
        encode_tokens(w, &self.tokens);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let amount = Amount::decode_from(r)?;
        let lockup_script = LockupScript::decode_from(r)?;
        let tokens = decode_tokens(r)?;
        Ok(ContractOutput {
            amount,
            lockup_script,
            tokens,
        })
    }
}

/// `TxOutput`: `0=Asset, 1=Contract`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum TxOutput {
    /// A standard spendable asset UTXO.
    Asset(AssetOutput),
    /// A contract-owned UTXO.
    Contract(ContractOutput),
}

impl TxOutput {
    /// The ALF amount, regardless of variant.
    pub fn amount(&self) -> &Amount {
        match self {
            TxOutput::Asset(o) => &o.amount,
            TxOutput::Contract(o) => &o.amount,
        }
    }

    /// The token list, regardless of variant.
    pub fn tokens(&self) -> &[Token] {
        match self {
            TxOutput::Asset(o) => &o.tokens,
            TxOutput::Contract(o) => &o.tokens,
        }
    }

    /// The lockup script, regardless of variant.
    pub fn lockup_script(&self) -> &LockupScript {
        match self {
            TxOutput::Asset(o) => &o.lockup_script,
            TxOutput::Contract(o) => &o.lockup_script,
        }
    }
}

impl Codec for TxOutput {
    fn encode_to(&self, w: &mut Writer) {
        match self {
            TxOutput::Asset(o) => {
                w.write_u8(0);
                o.encode_to(w);
            }
            TxOutput::Contract(o) => {
                w.write_u8(1);
                o.encode_to(w);
            }
        }
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u8()? {
            0 => Ok(TxOutput::Asset(AssetOutput::decode_from(r)?)),
            1 => Ok(TxOutput::Contract(ContractOutput::decode_from(r)?)),
            tag => Err(CodecError::UnknownTag(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_asset_output() -> AssetOutput {
        AssetOutput {
            amount: Amount::from_u64(1_000_000_000),
            lockup_script: LockupScript::P2PKH(Hash::hash(b"pk")),
            tokens: vec![(TokenId(Hash::hash(b"token")), Amount::from_u64(5))],
            lock_time: 0,
            additional_data: vec![],
        }
    }

    #[test]
    fn asset_output_round_trips() {
        let output = TxOutput::Asset(sample_asset_output());
        let bytes = output.to_bytes();
        let decoded = TxOutput::from_bytes(&bytes).unwrap();
        assert_eq!(output, decoded);
    }

    #[test]
    fn unlock_script_matches_lockup_variant() {
        let lockup = LockupScript::P2PKH(Hash::hash(b"pk"));
        assert!(UnlockScript::P2PKH(vec![1, 2, 3]).matches_lockup(&lockup));
        assert!(!UnlockScript::P2SH(vec![], vec![]).matches_lockup(&lockup));
    }

    #[test]
    fn amount_overflow_is_rejected() {
        let max = Amount(BigUint::from_bytes_be(&[0xffu8; 32]));
        assert!(max.checked_add(&Amount::from_u64(1)).is_none());
    }

    #[test]
    fn group_index_is_stable_for_same_script() {
        let lockup = LockupScript::P2PKH(Hash::hash(b"pk"));
        assert_eq!(lockup.group_index(4), lockup.group_index(4));
    }
}
