//! telemetry/counters.rs
//! Mutable counters collected while serving reads.
//!
//! Summary: Collects byte counts and request counts during reads.
//! Converted into immutable TelemetrySnapshot on demand.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCounters {
    /// Bytes handed to a reader straight from an existing buffer.
    pub bytes_from_buffer: u64,
    /// Bytes pulled from the single-pass source (or the card).
    pub bytes_from_source: u64,
    /// Calls made into the source.
    pub source_reads: u64,
    /// Views handed out by a stream buffer.
    pub views_opened: u64,
    /// READ BINARY style requests issued by a file cache.
    pub commands_sent: u64,
    /// Bytes a file cache answered without asking the card.
    pub bytes_served_from_cache: u64,
}

impl ReadCounters {
    /// Record bytes served from an already filled buffer.
    #[inline]
    pub fn add_buffer_hit(&mut self, n: usize) {
        self.bytes_from_buffer += n as u64;
    }

    /// Record one call into the source that produced `n` bytes.
    #[inline]
    pub fn add_source_read(&mut self, n: usize) {
        self.source_reads += 1;
        self.bytes_from_source += n as u64;
    }

    #[inline]
    pub fn add_view(&mut self) {
        self.views_opened += 1;
    }

    /// Record one command sent to the card returning `n` bytes.
    #[inline]
    pub fn add_command(&mut self, n: usize) {
        self.commands_sent += 1;
        self.bytes_from_source += n as u64;
    }

    #[inline]
    pub fn add_cache_hit(&mut self, n: usize) {
        self.bytes_served_from_cache += n as u64;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(&mut self, other: &ReadCounters) {
        *self += *other;
    }
}

impl AddAssign for ReadCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.bytes_from_buffer       += rhs.bytes_from_buffer;
        self.bytes_from_source       += rhs.bytes_from_source;
        self.source_reads            += rhs.source_reads;
        self.views_opened            += rhs.views_opened;
        self.commands_sent           += rhs.commands_sent;
        self.bytes_served_from_cache += rhs.bytes_served_from_cache;
    }
}
