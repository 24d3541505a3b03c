// Path: crates/types/src/codec.rs

//! The deterministic, wire- and disk-exact binary codec.
//!
//! Unlike most of the teacher crate's data, which is (de)serialized with
//! `parity-scale-codec` for its SCALE framing, every consensus-critical type
//! in this kernel (headers, transactions, outputs, targets) round-trips
//! through *this* codec instead, because the specification pins down an
//! exact byte layout:
//!
//! - fixed-width integers in big-endian,
//! - variable-length byte strings as `len:u32 ‖ bytes`,
//! - sequences as `len:u32 ‖ elements…`,
//! - sum types as `tag:u8 ‖ payload` with stable tag numbers.
//!
//! `parity-scale-codec`'s compact integers and little-endian framing would
//! violate that layout, so it is reserved for non-consensus-critical,
//! internal encodings (trie nodes, staging overlays) elsewhere in the
//! workspace.

use crate::hash::Hash;
use std::convert::TryInto;
use thiserror::Error;

/// A decode failure: truncated input, a bad tag byte, or a length that
/// doesn't fit the remaining bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before a complete value could be decoded.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A sum type's tag byte did not match any known variant.
    #[error("unknown tag byte: {0}")]
    UnknownTag(u8),
    /// A declared length exceeds a configured sanity bound.
    #[error("length {0} exceeds maximum {1}")]
    LengthTooLarge(u32, u32),
    /// Trailing bytes remained after decoding a top-level value.
    #[error("trailing bytes after decode")]
    TrailingBytes,
}

/// A cursor over an immutable byte slice, advanced as values are decoded.
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Wraps a byte slice for sequential decoding.
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf }
    }

    /// Returns the number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() < n {
            return Err(CodecError::UnexpectedEof);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Reads a single tag/flag byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a fixed-size `N`-byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let b = self.take(N)?;
        Ok(b.try_into().unwrap())
    }

    /// Reads a `len:u32 ‖ bytes` variable-length byte string.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_u32()?;
        if len > MAX_FIELD_LEN {
            return Err(CodecError::LengthTooLarge(len, MAX_FIELD_LEN));
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    /// Reads a `len:u32 ‖ elements…` sequence, decoding each element with
    /// `decode_one`.
    pub fn read_seq<T>(
        &mut self,
        mut decode_one: impl FnMut(&mut Self) -> Result<T, CodecError>,
    ) -> Result<Vec<T>, CodecError> {
        let len = self.read_u32()?;
        if len > MAX_SEQ_LEN {
            return Err(CodecError::LengthTooLarge(len, MAX_SEQ_LEN));
        }
        let mut out = Vec::with_capacity(len.min(4096) as usize);
        for _ in 0..len {
            out.push(decode_one(self)?);
        }
        Ok(out)
    }

    /// Reads a 32-byte [`Hash`].
    pub fn read_hash(&mut self) -> Result<Hash, CodecError> {
        Ok(Hash(self.read_array::<32>()?))
    }

    /// Fails with [`CodecError::TrailingBytes`] if any input remains.
    pub fn expect_exhausted(&self) -> Result<(), CodecError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes)
        }
    }
}

/// Sanity bound on a single variable-length byte string (16 MiB).
pub const MAX_FIELD_LEN: u32 = 16 * 1024 * 1024;
/// Sanity bound on the element count of a sequence.
pub const MAX_SEQ_LEN: u32 = 4 * 1024 * 1024;

/// An append-only byte buffer used while encoding.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes a single tag/flag byte.
    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    /// Writes a big-endian `u16`.
    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Writes a big-endian `u32`.
    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Writes a big-endian `u64`.
    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Writes a fixed-size byte array verbatim (no length prefix).
    pub fn write_array(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    /// Writes a `len:u32 ‖ bytes` variable-length byte string.
    pub fn write_bytes(&mut self, v: &[u8]) -> &mut Self {
        self.write_u32(v.len() as u32);
        self.buf.extend_from_slice(v);
        self
    }

    /// Writes a `len:u32 ‖ elements…` sequence, encoding each element with
    /// `encode_one`.
    pub fn write_seq<T>(&mut self, items: &[T], mut encode_one: impl FnMut(&mut Self, &T)) -> &mut Self {
        self.write_u32(items.len() as u32);
        for item in items {
            encode_one(self, item);
        }
        self
    }

    /// Writes a 32-byte [`Hash`].
    pub fn write_hash(&mut self, h: &Hash) -> &mut Self {
        self.write_array(h.as_bytes())
    }
}

/// A type that can be losslessly (de)serialized through the canonical codec.
pub trait Codec: Sized {
    /// Appends `self`'s canonical encoding to `w`.
    fn encode_to(&self, w: &mut Writer);

    /// Decodes a value from `r`, advancing the cursor past it.
    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError>;

    /// Encodes `self` into a freshly allocated byte vector.
    fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode_to(&mut w);
        w.into_bytes()
    }

    /// Decodes a value from `bytes`, requiring the entire input to be
    /// consumed (`deserialize(serialize(x)) == x` with no trailing bytes).
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let v = Self::decode_from(&mut r)?;
        r.expect_exhausted()?;
        Ok(v)
    }
}

impl Codec for Hash {
    fn encode_to(&self, w: &mut Writer) {
        w.write_hash(self);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_hash()
    }
}

impl Codec for bool {
    fn encode_to(&self, w: &mut Writer) {
        w.write_u8(if *self { 1 } else { 0 });
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(r.read_u8()? != 0)
    }
}

impl Codec for u64 {
    fn encode_to(&self, w: &mut Writer) {
        w.write_u64(*self);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_u64()
    }
}

impl Codec for Vec<u8> {
    fn encode_to(&self, w: &mut Writer) {
        w.write_bytes(self);
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips() {
        let h = Hash::hash(b"round-trip");
        let bytes = h.to_bytes();
        assert_eq!(bytes.len(), 32);
        let decoded = Hash::from_bytes(&bytes).unwrap();
        assert_eq!(h, decoded);
    }

    #[test]
    fn bytes_are_length_prefixed_big_endian() {
        let v: Vec<u8> = vec![1, 2, 3];
        let encoded = v.to_bytes();
        assert_eq!(&encoded[0..4], &[0, 0, 0, 3]);
        assert_eq!(&encoded[4..], &[1, 2, 3]);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = Hash::hash(b"x").to_bytes();
        bytes.push(0xff);
        assert_eq!(Hash::from_bytes(&bytes), Err(CodecError::TrailingBytes));
    }

    #[test]
    fn truncated_input_rejected() {
        let bytes = Hash::hash(b"x").to_bytes();
        assert_eq!(
            Hash::from_bytes(&bytes[..16]),
            Err(CodecError::UnexpectedEof)
        );
    }

    #[test]
    fn seq_round_trips() {
        let mut w = Writer::new();
        let items = vec![Hash::hash(b"a"), Hash::hash(b"b"), Hash::hash(b"c")];
        w.write_seq(&items, |w, h| w.write_hash(h));
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        let decoded = r.read_seq(|r| r.read_hash()).unwrap();
        assert_eq!(items, decoded);
    }
}
