//! tlv/decode.rs
//! Stateful BER-TLV decoder over any byte stream.
//!
//! Callers walk the structure tag by tag and decide for each object whether
//! to read its value, skip it, or descend into it. Only definite lengths are
//! supported. Not meant to be shared between threads.

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder};
use log::trace;

use crate::constants::{
    FILLER_BYTES, LENGTH_COUNT_MASK, MAX_LENGTH_BYTES, MAX_TAG_BYTES, MORE_BIT, TAG_NUMBER_MASK,
};
use crate::io::markable::{invalid_reset, MarkableRead, Positioned};
use crate::tlv::state::TlvState;
use crate::tlv::types::{is_primitive, leading_tag_byte, TagClass, TlvError};
use crate::utils::{enum_name_or_hex, hex_tag};

#[derive(Debug)]
pub struct BerTlvReader<R> {
    inner: R,
    state: TlvState,
    marked_state: Option<TlvState>,
}

impl<R: MarkableRead> BerTlvReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: TlvState::new(),
            marked_state: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Tag of the innermost open object.
    pub fn current_tag(&self) -> Option<u32> {
        self.state.tag()
    }

    /// Length of the innermost open object, once read.
    pub fn current_length(&self) -> Option<usize> {
        self.state.current().and_then(|f| f.length())
    }

    /// Number of open objects.
    pub fn depth(&self) -> usize {
        self.state.depth()
    }

    pub fn state(&self) -> &TlvState {
        &self.state
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut b = [0u8; 1];
        self.inner.read_exact(&mut b)?;
        Ok(b[0])
    }

    /// Reads the next tag, skipping `00`/`FF` fillers, and opens an object
    /// for it.
    pub fn read_tag(&mut self) -> Result<u32, TlvError> {
        if self.state.is_at_start_of_length() {
            return Err(TlvError::LengthNotRead);
        }
        let mut bytes_read = 0usize;
        let mut b = self.read_byte()?;
        bytes_read += 1;
        while FILLER_BYTES.contains(&b) {
            b = self.read_byte()?;
            bytes_read += 1;
        }

        let mut tag = u32::from(b);
        if b & TAG_NUMBER_MASK == TAG_NUMBER_MASK {
            // First byte is kept whole, subsequent bytes contribute 7 bits
            // each and the last one has the continuation bit clear.
            let mut tag_bytes = 1;
            loop {
                b = self.read_byte()?;
                bytes_read += 1;
                tag_bytes += 1;
                if tag_bytes > MAX_TAG_BYTES {
                    return Err(TlvError::TagTooLong);
                }
                tag = (tag << 8) | u32::from(b & !MORE_BIT);
                if b & MORE_BIT == 0 {
                    break;
                }
            }
        }

        self.state.set_tag_read(tag, bytes_read)?;
        trace!(
            "tag {} ({}) at depth {}",
            hex_tag(tag),
            enum_name_or_hex::<TagClass>(leading_tag_byte(tag) >> 6),
            self.state.depth()
        );
        Ok(tag)
    }

    /// Reads the definite length of the object whose tag was just read.
    pub fn read_length(&mut self) -> Result<usize, TlvError> {
        if !self.state.is_at_start_of_length() {
            return Err(TlvError::NotAtStartOfLength);
        }

        let b = self.read_byte()?;
        let mut bytes_read = 1usize;
        let length = if b & MORE_BIT == 0 {
            usize::from(b)
        } else {
            let count = usize::from(b & LENGTH_COUNT_MASK);
            if count == 0 {
                return Err(TlvError::IndefiniteLength);
            }
            if count > MAX_LENGTH_BYTES {
                return Err(TlvError::LengthTooLarge(count));
            }
            let mut encoded = [0u8; MAX_LENGTH_BYTES];
            self.inner.read_exact(&mut encoded[..count])?;
            bytes_read += count;
            let length = BigEndian::read_uint(&encoded[..count], count);
            usize::try_from(length).map_err(|_| TlvError::LengthTooLarge(count))?
        };

        self.state.set_length_read(length, bytes_read)?;
        trace!("length {length} for tag {:#X}", self.state.tag().unwrap_or_default());
        Ok(length)
    }

    /// Reads the remaining value bytes of the current object and closes it.
    pub fn read_value(&mut self) -> Result<Vec<u8>, TlvError> {
        if self.state.is_empty_value() {
            return Ok(Vec::new());
        }
        if !self.state.is_processing_value() {
            return Err(TlvError::LengthNotRead);
        }
        let left = self.state.value_bytes_left()?;
        let mut value = vec![0u8; left];
        self.inner.read_exact(&mut value)?;
        self.state.update_value_bytes_read(left)?;
        Ok(value)
    }

    /// Skips the remaining value bytes of the current object without
    /// materializing them. Returns the number of bytes skipped, 0 when not
    /// positioned inside a value.
    pub fn skip_value(&mut self) -> Result<usize, TlvError> {
        if self.state.is_at_start_of_tag() || self.state.is_at_start_of_length() {
            return Ok(0);
        }
        let left = self.state.value_bytes_left()?;
        let skipped = self.inner.skip(left as u64)? as usize;
        self.state.update_value_bytes_read(skipped)?;
        if skipped < left {
            return Err(TlvError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("value ended after {skipped} of {left} bytes"),
            )));
        }
        Ok(skipped)
    }

    /// Reads a complete primitive object: tag, length and value.
    pub fn read_tlv(&mut self) -> Result<(u32, Vec<u8>), TlvError> {
        let tag = self.read_tag()?;
        self.read_length()?;
        let value = self.read_value()?;
        Ok((tag, value))
    }

    /// Reads the next tag and fails unless it is `expected`.
    pub fn expect_tag(&mut self, expected: u32) -> Result<(), TlvError> {
        let found = self.read_tag()?;
        if found != expected {
            return Err(TlvError::UnexpectedTag { expected, found });
        }
        Ok(())
    }

    /// Depth-first search for `search_tag`.
    ///
    /// Primitive objects on the way are skipped, constructed ones are entered.
    /// On success the stream sits right after the tag, ready for
    /// [`Self::read_length`].
    pub fn skip_to_tag(&mut self, search_tag: u32) -> Result<(), TlvError> {
        loop {
            if self.state.is_at_start_of_tag() {
                // Next byte starts a tag.
            } else if self.state.is_at_start_of_length() {
                let length = self.read_length()?;
                if length == 0 || self.state.tag().is_some_and(is_primitive) {
                    self.skip_value()?;
                }
            } else if self.state.tag().is_some_and(is_primitive) {
                self.skip_value()?;
            }

            let tag = match self.read_tag() {
                Ok(tag) => tag,
                Err(TlvError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(TlvError::TagNotFound(search_tag));
                }
                Err(e) => return Err(e),
            };
            if tag == search_tag {
                return Ok(());
            }

            let length = self.read_length()?;
            if is_primitive(tag) || length == 0 {
                trace!("skipping {length} value bytes of tag {tag:#X}");
                // Also closes empty constructed objects.
                self.skip_value()?;
            }
        }
    }
}

impl<R: MarkableRead> Read for BerTlvReader<R> {
    /// Raw value bytes, clamped to what is left in the current object.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.state.is_at_start_of_length() {
            return Err(TlvError::LengthNotRead.into());
        }
        let limit = match self.state.value_bytes_left() {
            Ok(left) => buf.len().min(left),
            Err(_) => buf.len(),
        };
        let n = self.inner.read(&mut buf[..limit])?;
        self.state.update_value_bytes_read(n)?;
        Ok(n)
    }
}

impl<R: MarkableRead> MarkableRead for BerTlvReader<R> {
    /// Skips raw bytes; asking for more than the current object holds fails.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        if self.state.is_at_start_of_length() {
            return Err(TlvError::LengthNotRead.into());
        }
        if let (Ok(left), Some(tag)) = (self.state.value_bytes_left(), self.state.tag()) {
            if n > left as u64 {
                return Err(TlvError::ValueOverrun {
                    tag,
                    requested: usize::try_from(n).unwrap_or(usize::MAX),
                    remaining: left,
                }
                .into());
            }
        }
        let skipped = self.inner.skip(n)?;
        self.state.update_value_bytes_read(skipped as usize)?;
        Ok(skipped)
    }

    fn available(&self) -> usize {
        self.inner.available()
    }

    fn mark_supported(&self) -> bool {
        self.inner.mark_supported()
    }

    /// Marks the carrier and keeps a copy of the nesting stack.
    fn mark(&mut self, read_limit: usize) {
        self.inner.mark(read_limit);
        self.marked_state = Some(self.state.clone());
    }

    fn reset(&mut self) -> io::Result<()> {
        let marked = self.marked_state.clone().ok_or_else(invalid_reset)?;
        self.inner.reset()?;
        self.state = marked;
        Ok(())
    }
}

impl<R: MarkableRead + Positioned> Positioned for BerTlvReader<R> {
    fn position(&self) -> u64 {
        self.inner.position()
    }
}
