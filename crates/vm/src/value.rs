// Path: crates/vm/src/value.rs

//! `Val`: the VM's runtime value type. Strongly typed at the stack level —
//! a pop that sees the wrong variant aborts the frame with `InvalidType`.

use alephium_types::error::ExeFailure;
use num_bigint::{BigInt, BigUint};
use parity_scale_codec::{Decode, Encode, Error as ScaleError, Input, Output};

/// A runtime value on the operand stack or in a local/field slot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Val {
    /// A boolean.
    Bool(bool),
    /// A signed 256-bit integer.
    I256(BigInt),
    /// An unsigned 256-bit integer.
    U256(BigUint),
    /// An arbitrary byte string.
    ByteVec(Vec<u8>),
    /// A lockup-script address.
    Address(alephium_types::output::LockupScript),
}

impl Val {
    /// A short, stable name for error messages and logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Bool(_) => "Bool",
            Val::I256(_) => "I256",
            Val::U256(_) => "U256",
            Val::ByteVec(_) => "ByteVec",
            Val::Address(_) => "Address",
        }
    }

    /// Unwraps a `Bool`, or fails with `InvalidType`.
    pub fn as_bool(&self) -> Result<bool, ExeFailure> {
        match self {
            Val::Bool(b) => Ok(*b),
            _ => Err(ExeFailure::InvalidType),
        }
    }

    /// Unwraps an `I256`, or fails with `InvalidType`.
    pub fn as_i256(&self) -> Result<&BigInt, ExeFailure> {
        match self {
            Val::I256(v) => Ok(v),
            _ => Err(ExeFailure::InvalidType),
        }
    }

    /// Unwraps a `U256`, or fails with `InvalidType`.
    pub fn as_u256(&self) -> Result<&BigUint, ExeFailure> {
        match self {
            Val::U256(v) => Ok(v),
            _ => Err(ExeFailure::InvalidType),
        }
    }

    /// Unwraps a `ByteVec`, or fails with `InvalidType`.
    pub fn as_bytevec(&self) -> Result<&[u8], ExeFailure> {
        match self {
            Val::ByteVec(v) => Ok(v),
            _ => Err(ExeFailure::InvalidType),
        }
    }

    /// Unwraps an `Address`, or fails with `InvalidType`.
    pub fn as_address(&self) -> Result<&alephium_types::output::LockupScript, ExeFailure> {
        match self {
            Val::Address(a) => Ok(a),
            _ => Err(ExeFailure::InvalidType),
        }
    }

    /// The canonical byte encoding used by `*ToByteVec` conversions and by
    /// `Log1..Log5` topic serialization.
    pub fn to_bytevec(&self) -> Vec<u8> {
        match self {
            Val::Bool(b) => vec![*b as u8],
            Val::I256(v) => v.to_signed_bytes_be(),
            Val::U256(v) => v.to_bytes_be(),
            Val::ByteVec(v) => v.clone(),
            Val::Address(a) => {
                use alephium_types::codec::Codec;
                a.to_bytes()
            }
        }
    }
}

/// Manual `parity-scale-codec` framing for a contract's field vector
/// (`ContractState.fields`, stored opaque to `alephium-state` and
/// (de)serialized only here, where `Val` is defined).
impl Encode for Val {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        match self {
            Val::Bool(b) => {
                0u8.encode_to(dest);
                b.encode_to(dest);
            }
            Val::I256(v) => {
                1u8.encode_to(dest);
                v.to_signed_bytes_be().encode_to(dest);
            }
            Val::U256(v) => {
                2u8.encode_to(dest);
                v.to_bytes_be().encode_to(dest);
            }
            Val::ByteVec(v) => {
                3u8.encode_to(dest);
                v.encode_to(dest);
            }
            Val::Address(a) => {
                4u8.encode_to(dest);
                self::addr_bytes(a).encode_to(dest);
            }
        }
    }
}

fn addr_bytes(a: &alephium_types::output::LockupScript) -> Vec<u8> {
    use alephium_types::codec::Codec;
    a.to_bytes()
}

impl Decode for Val {
    fn decode<I: Input>(input: &mut I) -> Result<Self, ScaleError> {
        let tag = u8::decode(input)?;
        match tag {
            0 => Ok(Val::Bool(bool::decode(input)?)),
            1 => {
                let bytes = Vec::<u8>::decode(input)?;
                Ok(Val::I256(BigInt::from_signed_bytes_be(&bytes)))
            }
            2 => {
                let bytes = Vec::<u8>::decode(input)?;
                Ok(Val::U256(BigUint::from_bytes_be(&bytes)))
            }
            3 => Ok(Val::ByteVec(Vec::<u8>::decode(input)?)),
            4 => {
                use alephium_types::codec::Codec;
                let bytes = Vec::<u8>::decode(input)?;
                let addr = alephium_types::output::LockupScript::from_bytes(&bytes)
                    .map_err(|_| ScaleError::from("malformed Address"))?;
                Ok(Val::Address(addr))
            }
            _ => Err(ScaleError::from("unknown Val tag")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vals_round_trip_through_scale_codec() {
        let vals = vec![
            Val::Bool(true),
            Val::U256(BigUint::from(42u32)),
            Val::I256(BigInt::from(-7)),
            Val::ByteVec(vec![9, 9]),
        ];
        let encoded = vals.encode();
        let decoded = Vec::<Val>::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(vals, decoded);
    }

    #[test]
    fn wrong_variant_is_invalid_type() {
        let v = Val::Bool(true);
        assert_eq!(v.as_u256().unwrap_err(), ExeFailure::InvalidType);
    }

    #[test]
    fn bytevec_round_trips_through_to_bytevec() {
        let v = Val::ByteVec(vec![1, 2, 3]);
        assert_eq!(v.to_bytevec(), vec![1, 2, 3]);
    }
}
