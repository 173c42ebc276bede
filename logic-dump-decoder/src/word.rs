//! Word layout of the sampler wire format
//!
//! Each word is `totbit + 1` bits wide, sent little endian and zero-padded to a
//! whole number of bytes:
//!
//! ```text
//! byte 0:  [bit 7] [bit 6] [bit 5] [bit 4] [bit 3] [bit 2] [bit 1] [bit 0]
//! byte 1:  0       0       0     [topbit] [bit 11] [bit 10] [bit 9] [bit 8]
//! ```
//!
//! A clear top bit marks a data word. A set top bit marks a repeat counter, except
//! when the payload is all ones, which marks a device buffer overrun.
//!
//! The layout is limited to `totbit <= 63` so the whole word fits a `u64`.

use crate::config::{SignalDeclaration, MAX_PAYLOAD_BITS};
use crate::types::{DecodedUnit, DecoderError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Bit and byte geometry of one word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordLayout {
    totbit: u32,
    nbytes: usize,
}

impl WordLayout {
    /// Create a layout for `totbit` payload bits (1..=63)
    pub fn new(totbit: u32) -> Result<Self> {
        if totbit == 0 || totbit > MAX_PAYLOAD_BITS {
            return Err(DecoderError::InvalidConfig(format!(
                "payload width must be between 1 and {} bits, got {}",
                MAX_PAYLOAD_BITS, totbit
            )));
        }

        let nbytes = (totbit as usize + 1).div_ceil(8);
        Ok(Self { totbit, nbytes })
    }

    /// Layout for an ordered list of signal declarations
    pub fn from_signals(signals: &[SignalDeclaration]) -> Result<Self> {
        let totbit = signals
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.width));
        Self::new(totbit)
    }

    /// Payload bits per word
    pub fn totbit(&self) -> u32 {
        self.totbit
    }

    /// Bytes per word on the wire
    pub fn nbytes(&self) -> usize {
        self.nbytes
    }

    /// Mask covering the payload bits
    pub fn payload_mask(&self) -> u64 {
        (1u64 << self.totbit) - 1
    }

    /// The tag bit distinguishing data words from counter words
    pub fn top_bit(&self) -> u64 {
        1u64 << self.totbit
    }

    /// Payload value reserved for the overflow sentinel
    pub fn overflow_value(&self) -> u64 {
        self.payload_mask()
    }

    /// Largest repeat value that is not the overflow sentinel
    pub fn max_repeat(&self) -> u64 {
        self.payload_mask() - 1
    }

    /// Read a word as a little-endian integer
    ///
    /// Bytes beyond `nbytes` are ignored; a short slice reads as zero-padded.
    pub fn read(&self, word: &[u8]) -> u64 {
        let mut buf = [0u8; 8];
        let n = word.len().min(self.nbytes);
        buf[..n].copy_from_slice(&word[..n]);
        LittleEndian::read_u64(&buf) & (self.top_bit() | self.payload_mask())
    }

    /// Encode a data word carrying `payload` (masked to `totbit` bits)
    pub fn encode_sample(&self, payload: u64) -> Vec<u8> {
        self.pack(payload & self.payload_mask())
    }

    /// Encode a repeat counter word for `value + 2` idle ticks
    pub fn encode_repeat(&self, value: u64) -> Result<Vec<u8>> {
        if value > self.max_repeat() {
            return Err(DecoderError::RepeatOutOfRange {
                value,
                totbit: self.totbit,
                max: self.max_repeat(),
            });
        }
        Ok(self.pack(self.top_bit() | value))
    }

    /// Encode the overflow sentinel word
    pub fn encode_overflow(&self) -> Vec<u8> {
        self.pack(self.top_bit() | self.overflow_value())
    }

    /// Encode any decoded unit back into its wire word
    pub fn encode(&self, unit: &DecodedUnit) -> Result<Vec<u8>> {
        match *unit {
            DecodedUnit::Sample(payload) => Ok(self.encode_sample(payload)),
            DecodedUnit::RepeatCount(value) => self.encode_repeat(value),
            DecodedUnit::Overflow => Ok(self.encode_overflow()),
        }
    }

    fn pack(&self, raw: u64) -> Vec<u8> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, raw);
        buf[..self.nbytes].to_vec()
    }
}
