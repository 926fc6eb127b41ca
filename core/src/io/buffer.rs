//! io/buffer.rs
//! Replays one single-pass source to any number of independent views.
//!
//! Shared state (one per source):
//! - `contents`: the append-only byte buffer and the high-water mark
//! - `frontier`: the source itself, only touched by the view that needs
//!   bytes at or beyond the high-water mark
//!
//! Lock order is `frontier` then `contents`. Views behind the mark only take
//! a read lock on `contents`, so a view blocked on a slow source does not
//! stall views replaying bytes that are already buffered.

use std::io::{self, Read};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};

use crate::config::{ConfigError, ReadConfig};
use crate::io::markable::{invalid_reset, MarkableRead, Positioned};
use crate::telemetry::{ReadCounters, TelemetrySnapshot};

struct Contents {
    bytes: Vec<u8>,
    /// Bytes `[0, high_water_mark)` are valid.
    high_water_mark: usize,
    /// Where views see end-of-stream: the declared length, or less if the
    /// source ran dry early.
    end: usize,
}

struct Frontier {
    source: Option<Box<dyn Read + Send>>,
    counters: ReadCounters,
}

struct Shared {
    length: usize,
    config: ReadConfig,
    contents: RwLock<Contents>,
    frontier: Mutex<Frontier>,
    /// Counters merged from views that have been dropped.
    retired: Mutex<ReadCounters>,
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "lock poisoned")
}

impl Shared {
    fn contents(&self) -> io::Result<RwLockReadGuard<'_, Contents>> {
        self.contents.read().map_err(|_| poisoned())
    }

    fn contents_mut(&self) -> io::Result<RwLockWriteGuard<'_, Contents>> {
        self.contents.write().map_err(|_| poisoned())
    }

    fn frontier(&self) -> io::Result<MutexGuard<'_, Frontier>> {
        self.frontier.lock().map_err(|_| poisoned())
    }

    /// Pulls at most `want` bytes past the high-water mark for a view whose
    /// cursor sits at `cursor`.
    ///
    /// Returns without touching the source when another view already moved
    /// the mark past `cursor` while we waited for the frontier lock.
    fn advance(&self, cursor: usize, want: usize) -> io::Result<()> {
        let mut frontier = self.frontier()?;

        let (mark, end) = {
            let contents = self.contents()?;
            (contents.high_water_mark, contents.end)
        };
        if cursor < mark || mark >= end {
            return Ok(());
        }

        let request = self.config.block_size_for(want.min(end - mark));
        let source = match frontier.source.as_mut() {
            Some(source) => source,
            None => return Ok(()),
        };

        let mut chunk = vec![0u8; request];
        let n = loop {
            match source.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        let mut contents = self.contents_mut()?;
        if n == 0 {
            warn!(
                "source ended at {} of {} declared bytes",
                contents.high_water_mark, self.length
            );
            contents.end = contents.high_water_mark;
            frontier.source = None;
            return Ok(());
        }

        let start = contents.high_water_mark;
        contents.bytes[start..start + n].copy_from_slice(&chunk[..n]);
        contents.high_water_mark += n;
        frontier.counters.add_source_read(n);
        debug!(
            "source read {} bytes, high-water mark {} / {}",
            n, contents.high_water_mark, self.length
        );

        if contents.high_water_mark == self.length {
            // Nothing more will ever be needed from it.
            frontier.source = None;
        }
        Ok(())
    }
}

/// Buffers a source of known length and hands out fresh views over it.
///
/// Cloning is cheap and yields another handle onto the same buffer.
#[derive(Clone)]
pub struct InputStreamBuffer {
    shared: Arc<Shared>,
}

impl InputStreamBuffer {
    /// Wraps bytes that are already known. No source is ever consulted.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len();
        Self::build(
            Contents {
                bytes,
                high_water_mark: length,
                end: length,
            },
            None,
            ReadConfig::default(),
        )
    }

    /// Lazily buffers `length` bytes of `source`.
    ///
    /// The source must not be read by anyone else afterwards.
    pub fn new(source: impl Read + Send + 'static, length: usize) -> Self {
        Self::lazy(Box::new(source), length, ReadConfig::default())
    }

    /// Like [`Self::new`] with explicit block sizes, rejected unless valid.
    pub fn with_config(
        source: impl Read + Send + 'static,
        length: usize,
        config: ReadConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::lazy(Box::new(source), length, config))
    }

    fn lazy(source: Box<dyn Read + Send>, length: usize, config: ReadConfig) -> Self {
        Self::build(
            Contents {
                bytes: vec![0u8; length],
                high_water_mark: 0,
                end: length,
            },
            Some(source).filter(|_| length > 0),
            config,
        )
    }

    fn build(contents: Contents, source: Option<Box<dyn Read + Send>>, config: ReadConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                length: contents.bytes.len(),
                config,
                contents: RwLock::new(contents),
                frontier: Mutex::new(Frontier {
                    source,
                    counters: ReadCounters::default(),
                }),
                retired: Mutex::new(ReadCounters::default()),
            }),
        }
    }

    /// A new view positioned at offset 0.
    pub fn get_input_stream(&self) -> SubStream {
        let mut counters = ReadCounters::default();
        counters.add_view();
        SubStream {
            shared: Arc::clone(&self.shared),
            cursor: 0,
            marked: None,
            counters,
        }
    }

    /// Declared length of the source.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.length == 0
    }

    pub fn high_water_mark(&self) -> io::Result<usize> {
        Ok(self.shared.contents()?.high_water_mark)
    }

    /// Bytes buffered so far. Buffered bytes always form the prefix
    /// `[0, high_water_mark)`.
    pub fn bytes_buffered(&self) -> io::Result<usize> {
        self.high_water_mark()
    }

    /// Whether no view will ever need the source again.
    pub fn is_fully_buffered(&self) -> io::Result<bool> {
        let contents = self.shared.contents()?;
        Ok(contents.high_water_mark >= contents.end)
    }

    /// Counters of source reads plus those of views already dropped.
    pub fn telemetry(&self) -> io::Result<TelemetrySnapshot> {
        let mut total = self.shared.frontier()?.counters;
        total += *self.shared.retired.lock().map_err(|_| poisoned())?;
        Ok(TelemetrySnapshot::from(&total))
    }
}

impl std::fmt::Debug for InputStreamBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = self.high_water_mark().ok();
        f.debug_struct("InputStreamBuffer")
            .field("length", &self.shared.length)
            .field("high_water_mark", &mark)
            .finish()
    }
}

/// One independent reader over an [`InputStreamBuffer`].
pub struct SubStream {
    shared: Arc<Shared>,
    cursor: usize,
    marked: Option<usize>,
    counters: ReadCounters,
}

impl SubStream {
    #[inline]
    pub fn get_position(&self) -> usize {
        self.cursor
    }

    /// Declared length of the underlying source.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.length == 0
    }
}

impl Read for SubStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            {
                let contents = self.shared.contents()?;
                if self.cursor < contents.high_water_mark {
                    let n = buf.len().min(contents.high_water_mark - self.cursor);
                    buf[..n].copy_from_slice(&contents.bytes[self.cursor..self.cursor + n]);
                    self.cursor += n;
                    self.counters.add_buffer_hit(n);
                    return Ok(n);
                }
                if self.cursor >= contents.end {
                    return Ok(0);
                }
            }
            self.shared.advance(self.cursor, buf.len())?;
        }
    }
}

impl MarkableRead for SubStream {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        let mut skipped = 0usize;
        while skipped < n {
            {
                let contents = self.shared.contents()?;
                if self.cursor < contents.high_water_mark {
                    let step = (n - skipped).min(contents.high_water_mark - self.cursor);
                    self.cursor += step;
                    skipped += step;
                    continue;
                }
                if self.cursor >= contents.end {
                    break;
                }
            }
            // Skipped bytes still have to be pulled: other views may want them.
            self.shared.advance(self.cursor, n - skipped)?;
        }
        Ok(skipped as u64)
    }

    /// Bytes already buffered ahead of this view's cursor.
    fn available(&self) -> usize {
        self.shared
            .contents()
            .map(|c| c.high_water_mark.saturating_sub(self.cursor))
            .unwrap_or(0)
    }

    fn mark_supported(&self) -> bool {
        true
    }

    fn mark(&mut self, _read_limit: usize) {
        self.marked = Some(self.cursor);
    }

    fn reset(&mut self) -> io::Result<()> {
        self.cursor = self.marked.ok_or_else(invalid_reset)?;
        Ok(())
    }
}

impl Positioned for SubStream {
    fn position(&self) -> u64 {
        self.cursor as u64
    }
}

impl Drop for SubStream {
    fn drop(&mut self) {
        if let Ok(mut retired) = self.shared.retired.lock() {
            retired.merge(&self.counters);
        }
    }
}

impl std::fmt::Debug for SubStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubStream")
            .field("cursor", &self.cursor)
            .field("length", &self.shared.length)
            .finish()
    }
}
