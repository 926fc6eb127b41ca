//! Read configuration.
//!
//! Summary: how large a single source/APDU request may be and how many bytes
//! are fetched up front to discover a file's length.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_BLOCK_SIZE, DEFAULT_READ_AHEAD_LENGTH, MAX_BLOCK_SIZE, MIN_READ_AHEAD_LENGTH,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block size must be in 1..={max}, got {got}")]
    BlockSize { got: usize, max: usize },

    #[error("read-ahead length must be in {min}..={max}, got {got}")]
    ReadAhead { got: usize, min: usize, max: usize },
}

/// Tunables for reading card files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Largest number of bytes requested from a source in one call.
    pub max_block_size: usize,
    /// Prefix length read to decode a file's outer tag and length.
    pub read_ahead_length: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            read_ahead_length: DEFAULT_READ_AHEAD_LENGTH,
        }
    }
}

impl ReadConfig {
    pub fn new(max_block_size: usize, read_ahead_length: usize) -> Result<Self, ConfigError> {
        let config = Self {
            max_block_size,
            read_ahead_length,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::BlockSize {
                got: self.max_block_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        if self.read_ahead_length < MIN_READ_AHEAD_LENGTH
            || self.read_ahead_length > self.max_block_size
        {
            return Err(ConfigError::ReadAhead {
                got: self.read_ahead_length,
                min: MIN_READ_AHEAD_LENGTH,
                max: self.max_block_size,
            });
        }
        Ok(())
    }

    /// Size of the next request when `remaining` bytes are still wanted.
    #[inline]
    pub fn block_size_for(&self, remaining: usize) -> usize {
        self.max_block_size.min(remaining)
    }
}
