//! tlv/state.rs
//! Explicit nesting stack for the BER-TLV decoder.
//!
//! One frame per open TLV object. Tag and length bytes are charged to the
//! parent when they are read; when a frame's value is fully consumed it is
//! popped and its value length is charged to the parent, which may in turn
//! complete. Completion cascades in a loop, never by recursion, so hostile
//! nesting depth only costs heap.

use crate::tlv::types::TlvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvFrame {
    tag: u32,
    /// `None` until the length has been read.
    length: Option<usize>,
    /// Value bytes consumed so far, children's tag and length bytes included.
    bytes_read: usize,
}

impl TlvFrame {
    fn new(tag: u32) -> Self {
        Self {
            tag,
            length: None,
            bytes_read: 0,
        }
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Value bytes not consumed yet, 0 while the length is unknown.
    fn remaining(&self) -> usize {
        self.length.map_or(0, |length| length - self.bytes_read)
    }

    /// Plain charge without completing the frame.
    fn charge(&mut self, n: usize) -> Result<(), TlvError> {
        let length = self.length.ok_or(TlvError::LengthNotRead)?;
        let remaining = length - self.bytes_read;
        if n > remaining {
            return Err(TlvError::ValueOverrun {
                tag: self.tag,
                requested: n,
                remaining,
            });
        }
        self.bytes_read += n;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvState {
    frames: Vec<TlvFrame>,
    at_start_of_tag: bool,
    /// The last object read had length 0 and was closed at its length.
    empty_value: bool,
}

impl Default for TlvState {
    fn default() -> Self {
        Self::new()
    }
}

impl TlvState {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            at_start_of_tag: true,
            empty_value: false,
        }
    }

    #[inline]
    pub fn is_at_start_of_tag(&self) -> bool {
        self.at_start_of_tag
    }

    /// A tag has been read and its length has not.
    #[inline]
    pub fn is_at_start_of_length(&self) -> bool {
        self.frames.last().is_some_and(|f| f.length.is_none())
    }

    /// Positioned inside the value of the innermost object.
    #[inline]
    pub fn is_processing_value(&self) -> bool {
        !self.at_start_of_tag && self.frames.last().is_some_and(|f| f.length.is_some())
    }

    /// The object whose length was read last is empty and already closed.
    #[inline]
    pub fn is_empty_value(&self) -> bool {
        self.empty_value
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> Option<&TlvFrame> {
        self.frames.last()
    }

    pub fn tag(&self) -> Option<u32> {
        self.frames.last().map(TlvFrame::tag)
    }

    pub fn length(&self) -> Result<usize, TlvError> {
        self.frames
            .last()
            .and_then(|f| f.length)
            .ok_or(TlvError::LengthNotRead)
    }

    /// Value bytes of the innermost object not consumed yet.
    pub fn value_bytes_left(&self) -> Result<usize, TlvError> {
        let frame = self.frames.last().ok_or(TlvError::LengthNotRead)?;
        let length = frame.length.ok_or(TlvError::LengthNotRead)?;
        Ok(length - frame.bytes_read)
    }

    /// Pushes a frame for `tag` after `bytes_read` tag bytes (fillers included).
    pub fn set_tag_read(&mut self, tag: u32, bytes_read: usize) -> Result<(), TlvError> {
        if self.is_at_start_of_length() {
            return Err(TlvError::LengthNotRead);
        }
        if let Some(parent) = self.frames.last_mut() {
            parent.charge(bytes_read)?;
        }
        self.frames.push(TlvFrame::new(tag));
        self.at_start_of_tag = false;
        self.empty_value = false;
        Ok(())
    }

    pub fn set_length_read(&mut self, length: usize, bytes_read: usize) -> Result<(), TlvError> {
        if !self.is_at_start_of_length() {
            return Err(TlvError::NotAtStartOfLength);
        }
        let depth = self.frames.len();
        if depth >= 2 {
            let parent = &mut self.frames[depth - 2];
            parent.charge(bytes_read)?;
            let remaining = parent.remaining();
            if length > remaining {
                return Err(TlvError::ValueOverrun {
                    tag: parent.tag,
                    requested: length,
                    remaining,
                });
            }
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.length = Some(length);
        }
        self.at_start_of_tag = false;
        if length == 0 {
            // Complete as soon as it is opened.
            self.update_value_bytes_read(0)?;
            self.empty_value = true;
        }
        Ok(())
    }

    /// Accounts for `n` consumed value bytes of the innermost object, popping
    /// every object this completes.
    pub fn update_value_bytes_read(&mut self, n: usize) -> Result<(), TlvError> {
        let mut n = n;
        let mut popped = false;
        while let Some(frame) = self.frames.last_mut() {
            frame.charge(n)?;
            let length = frame.length.unwrap_or_default();
            if frame.bytes_read < length {
                // Mid-value, unless a child just closed and a sibling follows.
                self.at_start_of_tag = popped;
                return Ok(());
            }
            self.frames.pop();
            popped = true;
            n = length;
        }
        self.at_start_of_tag = true;
        Ok(())
    }
}
