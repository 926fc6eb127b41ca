//! telemetry/snapshot.rs
//!
//! Immutable view over [`ReadCounters`] with derived ratios.

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::ReadCounters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub bytes_from_buffer: u64,
    pub bytes_from_source: u64,
    pub source_reads: u64,
    pub views_opened: u64,
    pub commands_sent: u64,
    pub bytes_served_from_cache: u64,
    /// Share of delivered bytes that did not need the source, in `[0, 1]`.
    pub buffer_hit_ratio: f64,
    /// Mean bytes per source call, 0 when the source was never read.
    pub mean_source_read: f64,
}

impl TelemetrySnapshot {
    pub fn from(counters: &ReadCounters) -> Self {
        let hits = counters.bytes_from_buffer + counters.bytes_served_from_cache;
        let delivered = hits + counters.bytes_from_source;
        let buffer_hit_ratio = if delivered > 0 {
            hits as f64 / delivered as f64
        } else {
            0.0
        };

        let calls = counters.source_reads + counters.commands_sent;
        let mean_source_read = if calls > 0 {
            counters.bytes_from_source as f64 / calls as f64
        } else {
            0.0
        };

        Self {
            bytes_from_buffer: counters.bytes_from_buffer,
            bytes_from_source: counters.bytes_from_source,
            source_reads: counters.source_reads,
            views_opened: counters.views_opened,
            commands_sent: counters.commands_sent,
            bytes_served_from_cache: counters.bytes_served_from_cache,
            buffer_hit_ratio,
            mean_source_read,
        }
    }

    /// Internal consistency, mostly for tests.
    pub fn sanity_check(&self) -> bool {
        (0.0..=1.0).contains(&self.buffer_hit_ratio)
            && (self.bytes_from_source == 0 || self.source_reads + self.commands_sent > 0)
    }
}
