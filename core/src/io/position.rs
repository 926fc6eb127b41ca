//! io/position.rs
//! Decorator that counts the bytes a carrier actually delivered.

use std::io::{self, Read};

use crate::io::markable::{invalid_reset, MarkableRead, Positioned};

/// Tracks the absolute read position of the wrapped carrier.
///
/// The position moves by what the carrier reports, so a short read or a
/// short skip is visible to the caller instead of being rounded up.
#[derive(Debug)]
pub struct PositionReader<R> {
    inner: R,
    position: u64,
    marked_position: Option<u64>,
}

impl<R: MarkableRead> PositionReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: 0,
            marked_position: None,
        }
    }

    #[inline]
    pub fn get_position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: MarkableRead> Read for PositionReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: MarkableRead> MarkableRead for PositionReader<R> {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let skipped = self.inner.skip(n)?;
        self.position += skipped;
        Ok(skipped)
    }

    fn available(&self) -> usize {
        self.inner.available()
    }

    fn mark_supported(&self) -> bool {
        self.inner.mark_supported()
    }

    fn mark(&mut self, read_limit: usize) {
        self.inner.mark(read_limit);
        self.marked_position = Some(self.position);
    }

    fn reset(&mut self) -> io::Result<()> {
        let marked = self.marked_position.ok_or_else(invalid_reset)?;
        self.inner.reset()?;
        self.position = marked;
        Ok(())
    }
}

impl<R: MarkableRead> Positioned for PositionReader<R> {
    fn position(&self) -> u64 {
        self.position
    }
}
