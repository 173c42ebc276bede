//! Word sources backed by `std::io::Read`
//!
//! A serial device node, a capture file and standard input all look the same from
//! here: bytes arrive in arbitrary chunks and get reassembled into whole words. Line
//! settings (baud, parity) are applied to the device outside this tool; the nominal
//! baud is only carried along for diagnostics.

use super::buffer::WordBuffer;
use super::WordSource;
use crate::types::{DecoderError, Result};
use std::fs::File;
use std::io::{self, ErrorKind, Read, Stdin};
use std::path::Path;
use std::time::Duration;

/// Back-off after a read that would block
const WOULD_BLOCK_PAUSE: Duration = Duration::from_millis(1);

/// Reassembles whole words from any reader
pub struct ReaderSource<R> {
    reader: R,
    buffer: WordBuffer,
    bytes_read: u64,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_buffer(reader, WordBuffer::new())
    }

    pub fn with_buffer(reader: R, buffer: WordBuffer) -> Self {
        Self {
            reader,
            buffer,
            bytes_read: 0,
        }
    }

    /// Total bytes read from the underlying reader so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> WordSource for ReaderSource<R> {
    fn fetch(&mut self, n: usize) -> Result<Option<&[u8]>> {
        self.buffer.reserve_word(n);

        while self.buffer.available() < n {
            match self.buffer.fill_from(&mut self.reader) {
                Ok(0) => {
                    let leftover = self.buffer.available();
                    if leftover > 0 {
                        log::warn!(
                            "End of stream inside a word: discarding {} of {} bytes",
                            leftover,
                            n
                        );
                        self.buffer.clear();
                    }
                    return Ok(None);
                }
                Ok(count) => self.bytes_read += count as u64,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(WOULD_BLOCK_PAUSE);
                }
                Err(e) => return Err(DecoderError::SourceIo(e)),
            }
        }

        Ok(self.buffer.take(n))
    }
}

/// A serial device node or capture file
pub struct DeviceSource {
    inner: ReaderSource<File>,
}

impl DeviceSource {
    /// Open a device or file for reading
    pub fn open(path: &Path, baud: Option<f64>) -> Result<Self> {
        log::info!("Opening source: {:?}", path);

        let file = File::open(path).map_err(|e| DecoderError::SourceOpen {
            path: path.display().to_string(),
            source: e,
        })?;

        match baud {
            Some(baud) => log::debug!(
                "Nominal line rate {} baud (port settings are managed externally)",
                baud
            ),
            None => log::debug!("No nominal line rate given"),
        }

        Ok(Self {
            inner: ReaderSource::new(file),
        })
    }
}

impl WordSource for DeviceSource {
    fn fetch(&mut self, n: usize) -> Result<Option<&[u8]>> {
        self.inner.fetch(n)
    }
}

/// Standard input, for piped captures
pub type StdinSource = ReaderSource<Stdin>;

impl StdinSource {
    pub fn stdin() -> Self {
        log::info!("Reading words from standard input");
        ReaderSource::new(io::stdin())
    }
}
