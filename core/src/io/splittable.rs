//! io/splittable.rs
//! A stream that can spawn positioned copies of itself.

use std::io::{self, Read};

use log::trace;

use crate::config::{ConfigError, ReadConfig};
use crate::io::buffer::{InputStreamBuffer, SubStream};
use crate::io::markable::{MarkableRead, Positioned};
use crate::telemetry::TelemetrySnapshot;

/// Reads like the wrapped source and can split off independent views.
///
/// Every view yields the same bytes as the source and as every other view,
/// however reads are interleaved between them.
#[derive(Debug)]
pub struct SplittableStream {
    buffer: InputStreamBuffer,
    carrier: SubStream,
}

impl SplittableStream {
    /// Wraps a source that provides exactly `length` bytes.
    pub fn new(source: impl Read + Send + 'static, length: usize) -> Self {
        Self::from_buffer(InputStreamBuffer::new(source, length))
    }

    pub fn with_config(
        source: impl Read + Send + 'static,
        length: usize,
        config: ReadConfig,
    ) -> Result<Self, ConfigError> {
        InputStreamBuffer::with_config(source, length, config).map(Self::from_buffer)
    }

    pub fn from_buffer(buffer: InputStreamBuffer) -> Self {
        let carrier = buffer.get_input_stream();
        Self { buffer, carrier }
    }

    /// A fresh view positioned at `position`.
    ///
    /// Bytes before `position` that are not buffered yet are pulled from the
    /// source. Fails with `UnexpectedEof` if the source ends first.
    pub fn get_input_stream(&self, position: usize) -> io::Result<SubStream> {
        let mut view = self.buffer.get_input_stream();
        let skipped = view.skip(position as u64)?;
        if skipped < position as u64 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ends at {skipped}, before requested position {position}"),
            ));
        }
        trace!("split view at {position} of {}", self.buffer.len());
        Ok(view)
    }

    /// Bytes consumed through this stream (not through split views).
    #[inline]
    pub fn get_position(&self) -> usize {
        self.carrier.get_position()
    }

    /// Declared total length.
    #[inline]
    pub fn get_length(&self) -> usize {
        self.buffer.len()
    }

    pub fn bytes_buffered(&self) -> io::Result<usize> {
        self.buffer.bytes_buffered()
    }

    pub fn input_stream_buffer(&self) -> &InputStreamBuffer {
        &self.buffer
    }

    pub fn telemetry(&self) -> io::Result<TelemetrySnapshot> {
        self.buffer.telemetry()
    }
}

impl Read for SplittableStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.carrier.read(buf)
    }
}

impl MarkableRead for SplittableStream {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        self.carrier.skip(n)
    }

    fn available(&self) -> usize {
        self.carrier.available()
    }

    fn mark_supported(&self) -> bool {
        self.carrier.mark_supported()
    }

    fn mark(&mut self, read_limit: usize) {
        self.carrier.mark(read_limit)
    }

    fn reset(&mut self) -> io::Result<()> {
        self.carrier.reset()
    }
}

impl Positioned for SplittableStream {
    fn position(&self) -> u64 {
        self.carrier.position()
    }
}
