//! fragment/shared.rs
//! Thread-safe handle over a [`FragmentBuffer`].
//!
//! `FragmentBuffer` itself carries no synchronization. Consumers that share
//! one between threads go through this handle: every method takes the lock
//! exactly once, so a check-then-copy sequence such as [`Self::copy_range`]
//! can not observe a half-merged fragment set.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::fragment::buffer::FragmentBuffer;
use crate::fragment::types::{Fragment, FragmentError};

#[derive(Debug, Clone)]
pub struct SharedFragmentBuffer {
    inner: Arc<Mutex<FragmentBuffer>>,
}

impl SharedFragmentBuffer {
    pub fn new(length: usize) -> Self {
        Self::from_buffer(FragmentBuffer::new(length))
    }

    pub fn from_buffer(buffer: FragmentBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FragmentBuffer>, FragmentError> {
        self.inner.lock().map_err(|_| FragmentError::Poisoned)
    }

    /// Runs `f` with the buffer locked.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut FragmentBuffer) -> T) -> Result<T, FragmentError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    pub fn len(&self) -> Result<usize, FragmentError> {
        Ok(self.lock()?.len())
    }

    pub fn add_fragment(&self, offset: usize, bytes: &[u8]) -> Result<(), FragmentError> {
        self.lock()?.add_fragment(offset, bytes)
    }

    pub fn is_covered_by_fragment(&self, index: usize) -> Result<bool, FragmentError> {
        Ok(self.lock()?.is_covered_by_fragment(index))
    }

    pub fn get_buffered_length(&self, offset: usize) -> Result<usize, FragmentError> {
        Ok(self.lock()?.get_buffered_length(offset))
    }

    pub fn smallest_unbuffered_fragment(
        &self,
        offset: usize,
        length: usize,
    ) -> Result<Fragment, FragmentError> {
        Ok(self.lock()?.smallest_unbuffered_fragment(offset, length))
    }

    pub fn bytes_buffered(&self) -> Result<usize, FragmentError> {
        Ok(self.lock()?.bytes_buffered())
    }

    /// Copy of `[offset, offset + length)` if it is fully covered.
    pub fn copy_range(&self, offset: usize, length: usize) -> Result<Option<Vec<u8>>, FragmentError> {
        Ok(self.lock()?.get_range(offset, length).map(<[u8]>::to_vec))
    }

    /// Detached copy of the current state.
    pub fn snapshot(&self) -> Result<FragmentBuffer, FragmentError> {
        Ok(self.lock()?.clone())
    }
}
