//! cache/mod.rs
//! Card file access with per-file fragment caching.
//!
//! Responsibilities:
//! - Discover a file's length from its first bytes
//! - Fetch only the parts of a file that were never read
//! - Expose a cached file as a sequential, splittable stream
//!
//! Non-responsibilities:
//! - APDU construction and secure messaging (see [`CardFileSystem`])

pub mod types;
pub mod file_cache;
pub mod card_stream;

pub use types::{CacheError, CardFileSystem};
pub use file_cache::FileCache;
pub use card_stream::CardFileReader;
