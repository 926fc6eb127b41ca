//! mrtd-core
//!
//! Chunked reading, stream replay and BER-TLV parsing for ICAO 9303
//! travel document files.
//! No transport, no crypto, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod types;
pub mod utils;
pub mod telemetry;

// Buffers and streams
pub mod fragment;
pub mod io;

// Parsing and card access
pub mod tlv;
pub mod cache;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::cache::{CacheError, CardFileReader, CardFileSystem, FileCache};
    pub use crate::config::{ConfigError, ReadConfig};
    pub use crate::fragment::{Fragment, FragmentBuffer, FragmentError, SharedFragmentBuffer};
    pub use crate::io::{
        InputStreamBuffer, MarkableRead, PositionReader, Positioned, SplittableStream, SubStream,
    };
    pub use crate::telemetry::{ReadCounters, TelemetrySnapshot};
    pub use crate::tlv::{BerTlvReader, TagClass, TlvError};
    pub use crate::types::StreamError;
}
