//! cache/card_stream.rs
//! Sequential reader over one cached card file.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use crate::cache::file_cache::FileCache;
use crate::cache::types::{CacheError, CardFileSystem};
use crate::io::markable::{invalid_reset, MarkableRead, Positioned};

/// Reads file `fid` front to back in blocks of at most `max_block_size`
/// bytes, going through the shared [`FileCache`].
///
/// Skipping only moves the cursor, skipped bytes are never fetched.
pub struct CardFileReader<F> {
    cache: Arc<FileCache<F>>,
    fid: u16,
    length: usize,
    position: usize,
    marked_position: Option<usize>,
}

impl<F: CardFileSystem> CardFileReader<F> {
    pub fn new(cache: Arc<FileCache<F>>, fid: u16) -> Result<Self, CacheError> {
        let length = cache.file_length(fid)?;
        Ok(Self {
            cache,
            fid,
            length,
            position: 0,
            marked_position: None,
        })
    }

    pub fn fid(&self) -> u16 {
        self.fid
    }

    /// Total file length.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<F: CardFileSystem> Read for CardFileReader<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.length {
            return Ok(0);
        }
        let want = self.cache.config().block_size_for(buf.len().min(self.length - self.position));
        let bytes = self.cache.read(self.fid, self.position, want)?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        self.position += bytes.len();
        Ok(bytes.len())
    }
}

impl<F: CardFileSystem> MarkableRead for CardFileReader<F> {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let left = (self.length - self.position) as u64;
        let skipped = n.min(left);
        self.position += skipped as usize;
        Ok(skipped)
    }

    /// Bytes ahead of the cursor that are already cached.
    fn available(&self) -> usize {
        match self.cache.fragment_buffer(self.fid) {
            Ok(Some(buffer)) => buffer.get_buffered_length(self.position).unwrap_or(0),
            _ => 0,
        }
    }

    fn mark_supported(&self) -> bool {
        true
    }

    fn mark(&mut self, _read_limit: usize) {
        self.marked_position = Some(self.position);
    }

    fn reset(&mut self) -> io::Result<()> {
        self.position = self.marked_position.ok_or_else(invalid_reset)?;
        Ok(())
    }
}

impl<F> Positioned for CardFileReader<F> {
    fn position(&self) -> u64 {
        self.position as u64
    }
}

impl<F> fmt::Debug for CardFileReader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardFileReader")
            .field("fid", &format_args!("{:#06X}", self.fid))
            .field("length", &self.length)
            .field("position", &self.position)
            .finish()
    }
}
