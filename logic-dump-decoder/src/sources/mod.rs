//! Word sources
//!
//! This module contains the sources that feed fixed-size words to the decoder.
//! Each source blocks until a whole word is available, reports end-of-stream, or
//! fails; it never hands out a partial word.

use crate::types::Result;
use std::path::Path;

pub mod buffer;
pub mod reader;

// Re-export source types
pub use buffer::WordBuffer;
pub use reader::{DeviceSource, ReaderSource, StdinSource};

/// Path that selects standard input instead of a device
pub const STDIN_PATH: &str = "-";

/// Common trait for all word sources
pub trait WordSource {
    /// Block until `n` bytes are available and return them
    ///
    /// `Ok(None)` means end-of-stream.
    fn fetch(&mut self, n: usize) -> Result<Option<&[u8]>>;
}

impl<S: WordSource + ?Sized> WordSource for &mut S {
    fn fetch(&mut self, n: usize) -> Result<Option<&[u8]>> {
        (**self).fetch(n)
    }
}

impl<S: WordSource + ?Sized> WordSource for Box<S> {
    fn fetch(&mut self, n: usize) -> Result<Option<&[u8]>> {
        (**self).fetch(n)
    }
}

/// Pick a source for `path`: `-` is standard input, anything else a device or file
pub fn open_source(path: &Path, baud: Option<f64>) -> Result<Box<dyn WordSource>> {
    if path.as_os_str() == STDIN_PATH {
        Ok(Box::new(StdinSource::stdin()))
    } else {
        Ok(Box::new(DeviceSource::open(path, baud)?))
    }
}
