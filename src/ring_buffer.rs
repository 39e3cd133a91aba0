//! Fixed-capacity byte ring buffer shared by the feed path and the device callback.
//!
//! Writes and reads are all-or-nothing: a write that does not fit in the free
//! space is rejected in full, and a read that asks for more than is buffered
//! consumes nothing. Both are bounded memory copies with no allocation, apart
//! from the returned vector of [`RingBuffer::read`].
//!
//! The storage holds one byte more than the usable capacity, so equal cursors
//! always mean "empty" and a write that exactly fills the buffer still reads
//! back intact.

use crate::error::{PlaybackError, PlaybackResult};

/// A circular byte buffer with independent write and read cursors.
pub struct RingBuffer {
    storage: Box<[u8]>,
    write_cursor: usize,
    read_cursor: usize,
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .field("write_cursor", &self.write_cursor)
            .field("read_cursor", &self.read_cursor)
            .finish()
    }
}

impl RingBuffer {
    /// Create a ring buffer able to hold `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> PlaybackResult<Self> {
        if capacity == 0 {
            return Err(PlaybackError::InvalidCapacity(
                "ring buffer capacity must be greater than zero".to_string(),
            ));
        }
        let slots = capacity.checked_add(1).ok_or_else(|| {
            PlaybackError::InvalidCapacity(format!("capacity {} is too large", capacity))
        })?;

        Ok(Self {
            storage: vec![0u8; slots].into_boxed_slice(),
            write_cursor: 0,
            read_cursor: 0,
        })
    }

    /// Maximum number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.storage.len() - 1
    }

    /// Number of bytes written and not yet read.
    pub fn available(&self) -> usize {
        let slots = self.storage.len();
        (self.write_cursor + slots - self.read_cursor) % slots
    }

    /// Number of bytes that can be written without overflowing.
    pub fn free(&self) -> usize {
        self.capacity() - self.available()
    }

    /// Check if the buffer holds no data.
    pub fn is_empty(&self) -> bool {
        self.write_cursor == self.read_cursor
    }

    /// Check if the buffer has no free space left.
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Discard all buffered data.
    pub fn clear(&mut self) {
        self.write_cursor = 0;
        self.read_cursor = 0;
    }

    /// Copy all of `data` into the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Overflow`] without writing anything if
    /// `data` is larger than [`free`](Self::free).
    pub fn write(&mut self, data: &[u8]) -> PlaybackResult<()> {
        let free = self.free();
        if data.len() > free {
            return Err(PlaybackError::overflow(data.len(), free));
        }
        if data.is_empty() {
            return Ok(());
        }

        let slots = self.storage.len();
        let head = (slots - self.write_cursor).min(data.len());
        let (first, second) = data.split_at(head);
        self.storage[self.write_cursor..self.write_cursor + head].copy_from_slice(first);
        self.storage[..second.len()].copy_from_slice(second);

        self.write_cursor = (self.write_cursor + data.len()) % slots;
        Ok(())
    }

    /// Read exactly `size` bytes, or nothing if fewer are buffered.
    pub fn read(&mut self, size: usize) -> Option<Vec<u8>> {
        if size > self.available() {
            return None;
        }
        let mut out = vec![0u8; size];
        self.copy_out(&mut out);
        Some(out)
    }

    /// Fill `out` completely from the buffer without allocating.
    ///
    /// Returns `false` and leaves the buffer untouched when fewer than
    /// `out.len()` bytes are buffered.
    pub fn read_into(&mut self, out: &mut [u8]) -> bool {
        if out.len() > self.available() {
            return false;
        }
        self.copy_out(out);
        true
    }

    fn copy_out(&mut self, out: &mut [u8]) {
        if out.is_empty() {
            return;
        }
        let slots = self.storage.len();
        let head = (slots - self.read_cursor).min(out.len());
        let (first, second) = out.split_at_mut(head);
        first.copy_from_slice(&self.storage[self.read_cursor..self.read_cursor + head]);
        second.copy_from_slice(&self.storage[..second.len()]);

        self.read_cursor = (self.read_cursor + out.len()) % slots;
    }
}
