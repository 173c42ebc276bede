//! Owned read buffer with explicit fill and drain cursors

use std::io::{self, Read};

/// Default buffer size for serial reads
pub const DEFAULT_CAPACITY: usize = 512;

/// Accumulates partial reads until whole words can be drained
///
/// Bytes in `data[start..end]` are buffered and not yet handed out.
#[derive(Debug, Clone)]
pub struct WordBuffer {
    data: Vec<u8>,
    start: usize,
    end: usize,
}

impl WordBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(1)],
            start: 0,
            end: 0,
        }
    }

    /// Buffered bytes not yet drained
    pub fn available(&self) -> usize {
        self.end - self.start
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Make room for at least `n` buffered bytes
    pub fn reserve_word(&mut self, n: usize) {
        if self.data.len() < n {
            self.data.resize(n, 0);
        }
    }

    /// Read once from `reader` into the free space, returning the byte count
    ///
    /// Leftover bytes are moved to the front first so a word never wraps.
    pub fn fill_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.compact();
        let n = reader.read(&mut self.data[self.end..])?;
        self.end += n;
        Ok(n)
    }

    /// Drain exactly `n` bytes, or nothing if fewer are buffered
    pub fn take(&mut self, n: usize) -> Option<&[u8]> {
        if self.available() < n {
            return None;
        }
        let start = self.start;
        self.start += n;
        Some(&self.data[start..start + n])
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.data.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
    }
}

impl Default for WordBuffer {
    fn default() -> Self {
        Self::new()
    }
}
