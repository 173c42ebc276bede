//! Core types for the logic dump decoder library
//!
//! This module defines the fundamental types that the decoder emits when processing
//! a sampler word stream. The decoder only classifies words and keeps the clock -
//! rendering is left to the emitters.

use std::fmt;

/// Tick count since the start of the capture
pub type Ticks = u64;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid signal declaration '{0}': {1}")]
    InvalidSignalDeclaration(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Repeat count {value} does not fit a {totbit}-bit payload (max {max})")]
    RepeatOutOfRange { value: u64, totbit: u32, max: u64 },

    #[error("Failed to open source {path}: {source}")]
    SourceOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source read failed: {0}")]
    SourceIo(#[source] std::io::Error),

    #[error("Output write failed: {0}")]
    SinkIo(#[source] std::io::Error),
}

/// One decoded word - the primary output of the bitstream decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedUnit {
    /// A data word: raw payload bits (low `totbit` bits, top bit stripped)
    Sample(u64),

    /// `n + 2` ticks elapsed with no signal change
    RepeatCount(u64),

    /// Device-side buffer overrun; the state for this tick is unknown
    Overflow,
}

impl DecodedUnit {
    /// Number of ticks this unit advances the clock by
    pub fn ticks(&self) -> Ticks {
        match self {
            DecodedUnit::Sample(_) => 1,
            DecodedUnit::RepeatCount(n) => n + 2,
            DecodedUnit::Overflow => 1,
        }
    }
}

impl fmt::Display for DecodedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedUnit::Sample(bits) => write!(f, "Sample(0x{:X})", bits),
            DecodedUnit::RepeatCount(n) => write!(f, "Repeat({})", n),
            DecodedUnit::Overflow => write!(f, "Overflow"),
        }
    }
}

/// A decoded unit together with the tick at which it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedWord {
    /// Clock value before this unit advanced it
    pub timestamp: Ticks,
    pub unit: DecodedUnit,
}

/// The bits of one signal within a sample, most significant bit first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalBits {
    /// Field value, right-aligned
    pub value: u64,
    /// Declared width in bits (1..=63)
    pub width: u32,
}

impl SignalBits {
    pub fn new(value: u64, width: u32) -> Self {
        Self { value, width }
    }

    /// Iterate over the bits, high bit first
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).rev().map(move |i| (self.value >> i) & 1 == 1)
    }
}

impl fmt::Display for SignalBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
