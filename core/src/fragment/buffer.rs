//! fragment/buffer.rs
//! Fixed-capacity buffer plus the set of runs that have been written.
//!
//! Invariants (hold after every mutation):
//! - fragments are sorted by offset, pairwise disjoint and non-adjacent
//! - the union of fragments is exactly the set of written indices
//! - uncovered bytes keep their zero fill

use std::fmt;

use log::trace;

use crate::constants::DEFAULT_FRAGMENT_BUFFER_LEN;
use crate::fragment::types::{Fragment, FragmentError};

#[derive(Debug, Clone)]
pub struct FragmentBuffer {
    buffer: Vec<u8>,
    fragments: Vec<Fragment>,
}

impl FragmentBuffer {
    /// Zero-filled buffer of `length` bytes with nothing covered.
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0u8; length],
            fragments: Vec::new(),
        }
    }

    pub fn with_default_length() -> Self {
        Self::new(DEFAULT_FRAGMENT_BUFFER_LEN)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn add_byte(&mut self, offset: usize, b: u8) -> Result<(), FragmentError> {
        self.add_fragment(offset, &[b])
    }

    /// Copies `bytes` to `offset` and merges the written run with every
    /// fragment it overlaps or touches.
    ///
    /// Overlapping writes need not agree, the last write wins. A write that
    /// does not fit is rejected and leaves the buffer untouched.
    pub fn add_fragment(&mut self, offset: usize, bytes: &[u8]) -> Result<(), FragmentError> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= self.buffer.len())
            .ok_or(FragmentError::OutOfBounds {
                offset,
                length: bytes.len(),
                capacity: self.buffer.len(),
            })?;

        if bytes.is_empty() {
            return Ok(());
        }

        self.buffer[offset..end].copy_from_slice(bytes);

        // First fragment that ends at or after `offset` (touching counts),
        // last fragment that starts at or before `end`.
        let first = self.fragments.partition_point(|f| f.end() < offset);
        let last = self.fragments.partition_point(|f| f.offset() <= end);

        let (start, stop) = if first < last {
            (
                offset.min(self.fragments[first].offset()),
                end.max(self.fragments[last - 1].end()),
            )
        } else {
            (offset, end)
        };

        let merged = Fragment::new(start, stop - start);
        self.fragments.splice(first..last, std::iter::once(merged));
        trace!(
            "fragment {} merged {} run(s) into {}",
            Fragment::new(offset, bytes.len()),
            last - first,
            merged
        );
        Ok(())
    }

    fn fragment_at(&self, index: usize) -> Option<&Fragment> {
        let i = self.fragments.partition_point(|f| f.end() <= index);
        self.fragments.get(i).filter(|f| f.contains(index))
    }

    pub fn is_covered_by_fragment(&self, index: usize) -> bool {
        self.fragment_at(index).is_some()
    }

    /// Whether `[offset, offset + length)` lies inside a single fragment.
    pub fn is_covered_range(&self, offset: usize, length: usize) -> bool {
        if length == 0 {
            return offset <= self.buffer.len();
        }
        match (self.fragment_at(offset), offset.checked_add(length)) {
            (Some(f), Some(end)) => end <= f.end(),
            _ => false,
        }
    }

    /// Bytes readable forward from `offset` without hitting a gap.
    ///
    /// Returns 0 when `offset` is not covered.
    pub fn get_buffered_length(&self, offset: usize) -> usize {
        self.fragment_at(offset).map_or(0, |f| f.end() - offset)
    }

    /// One past the highest covered index, 0 when nothing is covered.
    pub fn position(&self) -> usize {
        self.fragments.last().map_or(0, Fragment::end)
    }

    /// Number of covered indices.
    pub fn bytes_buffered(&self) -> usize {
        self.fragments.iter().map(Fragment::length).sum()
    }

    /// Smallest sub-range of `[offset, offset + length)` that still has to be
    /// fetched so that the whole request becomes covered.
    ///
    /// Leading and trailing covered parts are cut off, covered runs strictly
    /// inside the request are fetched again. The request is clipped to the
    /// buffer length. A zero-length result means nothing is missing.
    pub fn smallest_unbuffered_fragment(&self, offset: usize, length: usize) -> Fragment {
        let mut start = offset.min(self.buffer.len());
        let mut end = offset.saturating_add(length).min(self.buffer.len());

        if let Some(f) = self.fragment_at(start) {
            start = f.end().min(end);
        }
        if start < end {
            if let Some(f) = self.fragment_at(end - 1) {
                end = f.offset().max(start);
            }
        }
        Fragment::new(start, end - start)
    }

    /// Snapshot of the current fragments, sorted by offset.
    pub fn get_fragments(&self) -> Vec<Fragment> {
        self.fragments.clone()
    }

    /// Backing bytes, uncovered positions hold zero.
    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Covered bytes of `[offset, offset + length)`, `None` if any are missing.
    pub fn get_range(&self, offset: usize, length: usize) -> Option<&[u8]> {
        if !self.is_covered_range(offset, length) {
            return None;
        }
        Some(&self.buffer[offset..offset + length])
    }
}

impl Default for FragmentBuffer {
    fn default() -> Self {
        Self::with_default_length()
    }
}

/// Equal when lengths and merged fragment sets agree, regardless of the
/// order or granularity of the writes that produced them.
impl PartialEq for FragmentBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.buffer.len() == other.buffer.len() && self.fragments == other.fragments
    }
}

impl Eq for FragmentBuffer {}

impl fmt::Display for FragmentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentBuffer [{}, [", self.buffer.len())?;
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{fragment}")?;
        }
        write!(f, "]]")
    }
}
