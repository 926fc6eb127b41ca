//! telemetry/mod.rs
//! Read counters and immutable snapshots.
//!
//! Notes:
//! - Card round trips are the expensive part, so the interesting numbers are
//!   how many bytes came from a source versus from a buffer.
//! - Counters are plain integers owned by one reader and merged into the
//!   shared total when that reader finishes, no atomics on the read path.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
