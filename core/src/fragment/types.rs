use std::fmt;
use thiserror::Error;

/// A contiguous run `[offset, offset + length)` inside a fragment buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fragment {
    offset: usize,
    length: usize,
}

impl Fragment {
    #[inline]
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// One past the last covered index.
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub const fn contains(&self, index: usize) -> bool {
        self.offset <= index && index < self.end()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.length == 0 {
            return write!(f, "[{} .. (0)]", self.offset);
        }
        write!(f, "[{} .. {} ({})]", self.offset, self.end() - 1, self.length)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    /// Write would land (partly) outside the buffer. The buffer never grows.
    #[error("fragment [{offset}, +{length}) exceeds buffer length {capacity}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        capacity: usize,
    },

    #[error("fragment buffer lock poisoned")]
    Poisoned,
}
