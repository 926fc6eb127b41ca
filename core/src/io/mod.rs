//! io/mod.rs
//! Stream plumbing between a card file and its consumers.
//!
//! Responsibilities:
//! - Count positions through decorated streams
//! - Buffer a single-pass source once and replay it to many readers
//! - Split positioned, independent views off a stream
//!
//! Non-responsibilities:
//! - APDU transport
//! - Parsing

pub mod markable;
pub mod position;
pub mod buffer;
pub mod splittable;

pub use markable::{MarkableRead, Positioned};
pub use position::PositionReader;
pub use buffer::{InputStreamBuffer, SubStream};
pub use splittable::SplittableStream;
