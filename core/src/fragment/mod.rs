//! fragment/mod.rs
//! Partially filled byte buffers.
//!
//! Responsibilities:
//! - Hold the bytes of a card file of known length
//! - Track which byte ranges have been filled in, merged into maximal runs
//! - Answer coverage queries so callers only fetch what is missing
//!
//! Non-responsibilities:
//! - IO
//! - Deciding when to fetch

pub mod types;
pub mod buffer;
pub mod shared;

pub use types::{Fragment, FragmentError};
pub use buffer::FragmentBuffer;
pub use shared::SharedFragmentBuffer;
