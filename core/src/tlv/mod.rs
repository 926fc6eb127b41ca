//! tlv/mod.rs
//! BER-TLV decoding and encoding for LDS files.
//!
//! The decoder is stream oriented: it never needs the whole file in memory
//! and lets the caller skip values it does not care about, which is what
//! makes partial reads of large data groups pay off.

pub mod types;
pub mod state;
pub mod decode;
pub mod encode;

pub use types::{is_constructed, is_primitive, TagClass, TlvError};
pub use state::{TlvFrame, TlvState};
pub use decode::BerTlvReader;
pub use encode::{encode, encode_constructed, encode_length, encode_tag, length_length, tag_length, TlvBuilder};
