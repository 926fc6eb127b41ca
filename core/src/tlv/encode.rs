//! tlv/encode.rs
//! BER-TLV encoding, the inverse of [`crate::tlv::BerTlvReader`].
//!
//! Tags use the same integer form the decoder produces: leading byte whole,
//! subsequent bytes with the continuation bit stripped.

use byteorder::{BigEndian, ByteOrder};

use crate::constants::{LENGTH_COUNT_MASK, MORE_BIT};

/// Number of significant bytes in a tag value, 1 for tag 0.
#[inline]
pub fn tag_length(tag: u32) -> usize {
    let significant = 4 - (tag.leading_zeros() / 8) as usize;
    significant.max(1)
}

/// Number of bytes `encode_length(length)` emits.
#[inline]
pub fn length_length(length: usize) -> usize {
    if length <= LENGTH_COUNT_MASK as usize {
        1
    } else {
        1 + value_bytes(length as u64)
    }
}

fn value_bytes(v: u64) -> usize {
    (8 - (v.leading_zeros() / 8) as usize).max(1)
}

/// Encodes a tag. Bytes between the first and the last get the continuation
/// bit set again.
pub fn encode_tag(tag: u32) -> Vec<u8> {
    let n = tag_length(tag);
    let be = tag.to_be_bytes();
    let mut out = be[4 - n..].to_vec();
    if n > 2 {
        for b in &mut out[1..n - 1] {
            *b |= MORE_BIT;
        }
    }
    out
}

/// Short form below 128, minimal long form above.
pub fn encode_length(length: usize) -> Vec<u8> {
    if length <= LENGTH_COUNT_MASK as usize {
        return vec![length as u8];
    }
    let count = value_bytes(length as u64);
    let mut out = vec![0u8; 1 + count];
    out[0] = MORE_BIT | count as u8;
    BigEndian::write_uint(&mut out[1..], length as u64, count);
    out
}

/// Encodes one object.
pub fn encode(tag: u32, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tag_length(tag) + length_length(value.len()) + value.len());
    out.extend(encode_tag(tag));
    out.extend(encode_length(value.len()));
    out.extend_from_slice(value);
    out
}

/// Encodes a constructed object around already encoded children.
pub fn encode_constructed(tag: u32, children: &[&[u8]]) -> Vec<u8> {
    encode(tag, &children.concat())
}

/// Builder for nested structures, mostly for fixtures.
#[derive(Debug, Default, Clone)]
pub struct TlvBuilder {
    data: Vec<u8>,
}

impl TlvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a complete object.
    pub fn add(mut self, tag: u32, value: &[u8]) -> Self {
        self.data.extend(encode(tag, value));
        self
    }

    /// Appends pre-encoded bytes, fillers included.
    pub fn add_raw(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    /// Wraps everything added so far in `tag`.
    pub fn wrap(self, tag: u32) -> Self {
        Self {
            data: encode(tag, &self.data),
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
