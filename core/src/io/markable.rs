//! io/markable.rs
//! Capability traits shared by the stream decorators.
//!
//! `std::io::Read` covers reading. Skipping with an honest count,
//! mark/reset and position tracking are layered on top by composition.

use std::io::{self, Cursor, Read};

const SKIP_SCRATCH_LEN: usize = 256;

/// A byte stream that can skip and, optionally, mark and rewind.
pub trait MarkableRead: Read {
    /// Skips up to `n` bytes, returning how many were actually skipped.
    ///
    /// A short count means the stream ended, callers must not assume `n`.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let mut scratch = [0u8; SKIP_SCRATCH_LEN];
        let mut skipped = 0u64;
        while skipped < n {
            let want = (n - skipped).min(SKIP_SCRATCH_LEN as u64) as usize;
            match self.read(&mut scratch[..want]) {
                Ok(0) => break,
                Ok(got) => skipped += got as u64,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(skipped)
    }

    /// Bytes that can be read without blocking.
    fn available(&self) -> usize {
        0
    }

    fn mark_supported(&self) -> bool {
        false
    }

    /// Remembers the current position. `read_limit` is advisory.
    fn mark(&mut self, _read_limit: usize) {}

    fn reset(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "mark/reset not supported",
        ))
    }
}

/// Absolute read position of a stream.
pub trait Positioned {
    fn position(&self) -> u64;
}

pub(crate) fn invalid_reset() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "invalid reset, was mark() called?")
}

impl MarkableRead for &[u8] {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let step = n.min(self.len() as u64) as usize;
        *self = &self[step..];
        Ok(step as u64)
    }

    fn available(&self) -> usize {
        self.len()
    }
}

impl<T: AsRef<[u8]>> MarkableRead for Cursor<T> {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        let pos = self.position().min(len);
        let step = n.min(len - pos);
        self.set_position(pos + step);
        Ok(step)
    }

    fn available(&self) -> usize {
        let len = self.get_ref().as_ref().len() as u64;
        len.saturating_sub(self.position()) as usize
    }
}

impl<R: MarkableRead + ?Sized> MarkableRead for Box<R> {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        (**self).skip(n)
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn mark_supported(&self) -> bool {
        (**self).mark_supported()
    }

    fn mark(&mut self, read_limit: usize) {
        (**self).mark(read_limit)
    }

    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }
}

impl<R: MarkableRead + ?Sized> MarkableRead for &mut R {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        (**self).skip(n)
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn mark_supported(&self) -> bool {
        (**self).mark_supported()
    }

    fn mark(&mut self, read_limit: usize) {
        (**self).mark(read_limit)
    }

    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }
}
