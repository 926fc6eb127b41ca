use std::io;

use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::constants::{CONSTRUCTED_BIT, MAX_LENGTH_BYTES};

/// Errors raised while decoding BER-TLV.
///
/// I/O failures from the carrier pass through untouched as [`TlvError::Io`].
#[derive(Debug, Error)]
pub enum TlvError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// `read_length` without a pending tag, or called twice.
    #[error("not at start of length: tag not read yet, or length already read")]
    NotAtStartOfLength,

    /// Value access while the current object's length is still unknown.
    #[error("length of the current TLV object not read yet")]
    LengthNotRead,

    #[error("cannot consume {requested} bytes, only {remaining} left in TLV object {tag:#X}")]
    ValueOverrun {
        tag: u32,
        requested: usize,
        remaining: usize,
    },

    #[error("indefinite length encoding is not supported")]
    IndefiniteLength,

    #[error("length encoded in {0} bytes, at most {MAX_LENGTH_BYTES} supported")]
    LengthTooLarge(usize),

    #[error("tag does not fit in 4 bytes")]
    TagTooLong,

    #[error("expected tag {expected:#X}, found {found:#X}")]
    UnexpectedTag { expected: u32, found: u32 },

    #[error("tag {0:#X} not found before end of stream")]
    TagNotFound(u32),
}

impl From<TlvError> for io::Error {
    fn from(e: TlvError) -> Self {
        match e {
            TlvError::Io(e) => e,
            e @ (TlvError::NotAtStartOfLength
            | TlvError::LengthNotRead
            | TlvError::ValueOverrun { .. }) => io::Error::new(io::ErrorKind::InvalidInput, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Class bits (the two high bits of the leading tag byte).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum TagClass {
    Universal       = 0,
    Application     = 1,
    ContextSpecific = 2,
    Private         = 3,
}

impl TagClass {
    pub fn of(tag: u32) -> Self {
        TagClass::try_from(leading_tag_byte(tag) >> 6).unwrap_or(TagClass::Universal)
    }
}

/// Most significant non-zero byte of a tag value, 0 for tag 0.
#[inline]
pub fn leading_tag_byte(tag: u32) -> u8 {
    tag.to_be_bytes()
        .into_iter()
        .find(|b| *b != 0)
        .unwrap_or(0)
}

/// A tag is primitive when bit 6 of its leading byte is clear.
#[inline]
pub fn is_primitive(tag: u32) -> bool {
    leading_tag_byte(tag) & CONSTRUCTED_BIT == 0
}

#[inline]
pub fn is_constructed(tag: u32) -> bool {
    !is_primitive(tag)
}
