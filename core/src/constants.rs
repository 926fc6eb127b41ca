//! Wire constants and defaults shared across the crate.

/// Padding bytes that may precede a tag and are skipped by the decoder.
pub const FILLER_BYTES: [u8; 2] = [0x00, 0xFF];

/// Low five bits of the first tag byte all set: the tag continues.
pub const TAG_NUMBER_MASK: u8 = 0x1F;
/// Bit 6 of the leading tag byte: constructed encoding.
pub const CONSTRUCTED_BIT: u8 = 0x20;
/// Continuation bit on subsequent tag bytes and long-form length marker.
pub const MORE_BIT: u8 = 0x80;
/// Low seven bits of the first length byte in long form.
pub const LENGTH_COUNT_MASK: u8 = 0x7F;

/// Largest number of length bytes we accept in long form (fits a `u64`).
pub const MAX_LENGTH_BYTES: usize = 8;
/// Largest number of tag bytes we accept (a tag must fit a `u32`).
pub const MAX_TAG_BYTES: usize = 4;

/// Default capacity of a fragment buffer whose length is not known yet.
pub const DEFAULT_FRAGMENT_BUFFER_LEN: usize = 1024;

/// Largest READ BINARY response that fits a short APDU once wrapped.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 223;
/// Upper sanity bound for a single block (extended length APDU).
pub const MAX_BLOCK_SIZE: usize = 65536;
/// Bytes read up front to learn a file's outer tag and length.
pub const DEFAULT_READ_AHEAD_LENGTH: usize = 8;
/// Smallest read-ahead that can hold a tag plus a long-form length.
pub const MIN_READ_AHEAD_LENGTH: usize = 4;

/// CVCA file identification.
///
/// The CVCA file does not start with a BER-TLV length, it is a fixed size
/// record starting with the CAR tag.
pub mod cvca {
    pub const CAR_TAG: u32 = 0x42;
    pub const LENGTH: usize = 36;
}

/// Tags used by the ICAO 9303 logical data structure.
pub mod tags {
    pub const COM: u32 = 0x60;
    pub const DG1: u32 = 0x61;
    pub const DG2: u32 = 0x75;
    pub const DG11: u32 = 0x6B;
    pub const DG12: u32 = 0x6C;
    pub const SOD: u32 = 0x77;

    pub const LDS_VERSION: u32 = 0x5F01;
    pub const UNICODE_VERSION: u32 = 0x5F36;
    pub const TAG_LIST: u32 = 0x5C;
    pub const MRZ_INFO: u32 = 0x5F1F;

    /// CBEFF biometric information group template.
    pub const BIOMETRIC_INFORMATION_GROUP_TEMPLATE: u32 = 0x7F61;
    pub const BIOMETRIC_INFO_COUNT: u32 = 0x02;
    pub const BIOMETRIC_INFORMATION_TEMPLATE: u32 = 0x7F60;
    pub const BIOMETRIC_HEADER_TEMPLATE_BASE: u32 = 0xA1;
    pub const BIOMETRIC_DATA_BLOCK: u32 = 0x5F2E;
}
