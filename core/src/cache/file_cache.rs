//! cache/file_cache.rs
//! Per-file fragment cache in front of a [`CardFileSystem`].
//!
//! Every file is read at most once: each request only fetches the smallest
//! fragment not buffered yet and the rest is served from memory.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::cache::card_stream::CardFileReader;
use crate::cache::types::{CacheError, CardFileSystem};
use crate::config::ReadConfig;
use crate::constants::cvca;
use crate::fragment::{Fragment, FragmentBuffer, SharedFragmentBuffer};
use crate::io::SplittableStream;
use crate::telemetry::{ReadCounters, TelemetrySnapshot};
use crate::tlv::{BerTlvReader, TlvError};
use crate::utils::{hex_fid, hexify};

struct Card<F> {
    fs: F,
    selected: Option<u16>,
}

impl<F: CardFileSystem> Card<F> {
    fn select(&mut self, fid: u16) -> Result<(), CacheError> {
        if self.selected != Some(fid) {
            self.selected = None;
            self.fs.select_file(fid)?;
            self.selected = Some(fid);
            trace!("selected {}", hex_fid(fid));
        }
        Ok(())
    }
}

pub struct FileCache<F> {
    card: Mutex<Card<F>>,
    files: Mutex<HashMap<u16, SharedFragmentBuffer>>,
    config: ReadConfig,
    counters: Mutex<ReadCounters>,
}

impl<F: CardFileSystem> FileCache<F> {
    pub fn new(fs: F) -> Self {
        Self::build(fs, ReadConfig::default())
    }

    pub fn with_config(fs: F, config: ReadConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self::build(fs, config))
    }

    fn build(fs: F, config: ReadConfig) -> Self {
        Self {
            card: Mutex::new(Card { fs, selected: None }),
            files: Mutex::new(HashMap::new()),
            config,
            counters: Mutex::new(ReadCounters::default()),
        }
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    fn card(&self) -> Result<MutexGuard<'_, Card<F>>, CacheError> {
        self.card.lock().map_err(|_| CacheError::Poisoned)
    }

    fn files(&self) -> Result<MutexGuard<'_, HashMap<u16, SharedFragmentBuffer>>, CacheError> {
        self.files.lock().map_err(|_| CacheError::Poisoned)
    }

    fn record(&self, f: impl FnOnce(&mut ReadCounters)) -> Result<(), CacheError> {
        let mut counters = self.counters.lock().map_err(|_| CacheError::Poisoned)?;
        f(&mut counters);
        Ok(())
    }

    /// Buffer for `fid`, creating it from the file's header on first use.
    fn buffer(&self, fid: u16) -> Result<SharedFragmentBuffer, CacheError> {
        if let Some(buffer) = self.files()?.get(&fid) {
            return Ok(buffer.clone());
        }

        // Card lock first, then the map, same as `fetch`.
        let mut card = self.card()?;
        if let Some(buffer) = self.files()?.get(&fid) {
            return Ok(buffer.clone());
        }

        card.select(fid)?;
        let prefix = card.fs.read_binary(0, self.config.read_ahead_length)?;
        self.record(|c| c.add_command(prefix.len()))?;
        if prefix.is_empty() {
            return Err(CacheError::ShortFile { fid, offset: 0, length: self.config.read_ahead_length });
        }

        let length = decode_file_length(fid, &prefix)?;
        let mut buffer = FragmentBuffer::new(length);
        buffer.add_fragment(0, &prefix[..prefix.len().min(length)])?;
        debug!("file {} is {length} bytes", hex_fid(fid));

        let shared = SharedFragmentBuffer::from_buffer(buffer);
        self.files()?.insert(fid, shared.clone());
        Ok(shared)
    }

    /// Total length of file `fid`, read from its outer tag and length.
    pub fn file_length(&self, fid: u16) -> Result<usize, CacheError> {
        Ok(self.buffer(fid)?.len()?)
    }

    /// Bytes `[offset, offset + length)` of file `fid`, clipped to the end
    /// of the file.
    pub fn read(&self, fid: u16, offset: usize, length: usize) -> Result<Bytes, CacheError> {
        let buffer = self.buffer(fid)?;
        let file_length = buffer.len()?;
        if offset > file_length {
            return Err(CacheError::OffsetOutOfRange { fid, offset, length: file_length });
        }
        let length = length.min(file_length - offset);

        let missing = buffer.smallest_unbuffered_fragment(offset, length)?;
        if !missing.is_empty() {
            self.fetch(fid, &buffer, missing)?;
        }
        self.record(|c| c.add_cache_hit(length - missing.length()))?;

        let bytes = buffer.copy_range(offset, length)?.ok_or(CacheError::ShortFile {
            fid,
            offset,
            length: file_length,
        })?;
        Ok(Bytes::from(bytes))
    }

    fn fetch(&self, fid: u16, buffer: &SharedFragmentBuffer, missing: Fragment) -> Result<(), CacheError> {
        let mut card = self.card()?;
        card.select(fid)?;

        let mut offset = missing.offset();
        while offset < missing.end() {
            let want = self.config.block_size_for(missing.end() - offset);
            let chunk = card.fs.read_binary(offset, want)?;
            self.record(|c| c.add_command(chunk.len()))?;
            if chunk.is_empty() {
                warn!("file {} ended at {offset}, expected {}", hex_fid(fid), missing.end());
                return Err(CacheError::ShortFile { fid, offset, length: buffer.len()? });
            }
            let n = chunk.len().min(missing.end() - offset);
            buffer.add_fragment(offset, &chunk[..n])?;
            offset += n;
        }
        trace!("fetched {missing} of {}", hex_fid(fid));
        Ok(())
    }

    /// Whether the header of `fid` has been read already.
    pub fn is_cached(&self, fid: u16) -> Result<bool, CacheError> {
        Ok(self.files()?.contains_key(&fid))
    }

    /// Handle on the fragments cached for `fid`, if any.
    pub fn fragment_buffer(&self, fid: u16) -> Result<Option<SharedFragmentBuffer>, CacheError> {
        Ok(self.files()?.get(&fid).cloned())
    }

    /// Drops everything cached for `fid`.
    pub fn evict(&self, fid: u16) -> Result<bool, CacheError> {
        Ok(self.files()?.remove(&fid).is_some())
    }

    pub fn telemetry(&self) -> Result<TelemetrySnapshot, CacheError> {
        let counters = self.counters.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(TelemetrySnapshot::from(&*counters))
    }
}

impl<F: CardFileSystem + 'static> FileCache<F> {
    /// Block-wise reader over file `fid`.
    pub fn open(self: &Arc<Self>, fid: u16) -> Result<CardFileReader<F>, CacheError> {
        CardFileReader::new(Arc::clone(self), fid)
    }

    /// Splittable stream over file `fid`.
    pub fn open_stream(self: &Arc<Self>, fid: u16) -> Result<SplittableStream, CacheError> {
        let reader = self.open(fid)?;
        let length = reader.len();
        Ok(SplittableStream::with_config(reader, length, self.config)?)
    }
}

/// Decodes a file's total length from its first bytes.
fn decode_file_length(fid: u16, prefix: &[u8]) -> Result<usize, CacheError> {
    let mut reader = BerTlvReader::new(Cursor::new(prefix));
    let header = reader.read_tag().and_then(|tag| {
        if tag == cvca::CAR_TAG {
            return Ok(None);
        }
        reader.read_length().map(Some)
    });

    match header {
        Ok(None) => Ok(cvca::LENGTH),
        Ok(Some(value_length)) => {
            let header_length = reader.get_ref().position() as usize;
            Ok(header_length + value_length)
        }
        Err(TlvError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            warn!(
                "file {} header does not fit in {} bytes: {}",
                hex_fid(fid),
                prefix.len(),
                hexify(prefix)
            );
            Err(CacheError::ShortFile { fid, offset: prefix.len(), length: prefix.len() })
        }
        Err(e) => Err(e.into()),
    }
}
