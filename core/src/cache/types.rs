use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::fragment::FragmentError;
use crate::tlv::TlvError;

/// Transport seam between the file cache and a card.
///
/// Implementations translate these calls into SELECT FILE and READ BINARY
/// commands (secure messaging included); the cache never sees APDUs.
pub trait CardFileSystem: Send {
    /// Makes `fid` the current file.
    fn select_file(&mut self, fid: u16) -> Result<(), CacheError>;

    /// Reads up to `length` bytes of the current file from `offset`.
    ///
    /// Returning fewer bytes than asked is allowed, an empty result means the
    /// file ends at `offset`.
    fn read_binary(&mut self, offset: usize, length: usize) -> Result<Vec<u8>, CacheError>;
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("fragment buffer: {0}")]
    Fragment(#[from] FragmentError),

    #[error("file header: {0}")]
    Tlv(#[from] TlvError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("no file selected")]
    NoFileSelected,

    #[error("file {fid:#06X} not found")]
    FileNotFound { fid: u16 },

    #[error("offset {offset} beyond end of file {fid:#06X} ({length} bytes)")]
    OffsetOutOfRange { fid: u16, offset: usize, length: usize },

    #[error("file {fid:#06X} ended at {offset}, expected {length} bytes")]
    ShortFile { fid: u16, offset: usize, length: usize },

    /// Error reported by the transport, status words included.
    #[error("transport: {0}")]
    Transport(String),

    #[error("lock poisoned")]
    Poisoned,
}

impl From<CacheError> for io::Error {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Io(e) => e,
            CacheError::Tlv(e) => e.into(),
            e @ (CacheError::ShortFile { .. }) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e @ (CacheError::FileNotFound { .. }) => io::Error::new(io::ErrorKind::NotFound, e),
            e @ (CacheError::OffsetOutOfRange { .. }) => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            e => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}
