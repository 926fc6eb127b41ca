use std::io;

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::fragment::FragmentError;
use crate::tlv::TlvError;

/// Unified error covering every layer of the crate.
/// - `From<T>` impls let `?` cross layer boundaries.
/// - Layer errors are kept intact for callers that need to match on them.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("fragment error: {0}")]
    Fragment(#[from] FragmentError),

    #[error("tlv error: {0}")]
    Tlv(#[from] TlvError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
