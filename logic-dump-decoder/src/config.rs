//! Decoder configuration types
//!
//! This module defines the run configuration the decoder needs: the ordered signal
//! declarations, the sample clock frequency and the output shape. It is supplied once
//! and never changes during a run.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between a signal name and its bit-width annotation (`data/3`)
pub const WIDTH_DELIMITER: char = '/';

/// Largest payload width: the top bit must still fit a 64-bit word
pub const MAX_PAYLOAD_BITS: u32 = 63;

/// A named, fixed-width channel multiplexed into each sample word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignalDeclaration {
    /// Display name (the part before any `/width` annotation)
    pub name: String,
    /// Width in bits
    pub width: u32,
}

impl SignalDeclaration {
    /// Create a declaration with an explicit width
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }

    /// Create a single-bit declaration
    pub fn bit(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }
}

impl FromStr for SignalDeclaration {
    type Err = DecoderError;

    /// Parse `name` (1 bit) or `name/width`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            DecoderError::InvalidSignalDeclaration(s.to_string(), reason.to_string())
        };

        let (name, width) = match s.split_once(WIDTH_DELIMITER) {
            Some((name, width)) => {
                let width: u32 = width
                    .trim()
                    .parse()
                    .map_err(|_| invalid("width is not a positive integer"))?;
                (name, width)
            }
            None => (s, 1),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if width == 0 {
            return Err(invalid("width must be at least 1"));
        }

        Ok(Self::new(name, width))
    }
}

impl TryFrom<String> for SignalDeclaration {
    type Error = DecoderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SignalDeclaration> for String {
    fn from(decl: SignalDeclaration) -> Self {
        decl.to_string()
    }
}

impl fmt::Display for SignalDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 1 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}{}", self.name, WIDTH_DELIMITER, self.width)
        }
    }
}

/// Output encoding, fixed for the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Timestamp-indexed event log (VCD)
    #[default]
    Vcd,
    /// Column-aligned human trace
    Ascii,
}

/// Where the structured trace puts the closing marker after an overflow block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowMarker {
    /// At twice the overflow's scaled time, as existing traces have it
    #[default]
    Legacy,
    /// At the tick following the overflow
    NextTick,
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Ordered signal declarations; first declared occupies the highest payload bits
    #[serde(default)]
    pub signals: Vec<SignalDeclaration>,

    /// Sample clock frequency in MHz
    pub frequency_mhz: f64,

    /// Output encoding (default: VCD)
    #[serde(default)]
    pub format: OutputFormat,

    /// Overflow closing-marker placement for VCD output
    #[serde(default)]
    pub overflow_marker: OverflowMarker,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the sample clock frequency
    pub fn with_frequency_mhz(mut self, mhz: f64) -> Self {
        self.frequency_mhz = mhz;
        self
    }

    /// Builder method: append a signal declaration
    pub fn add_signal(mut self, signal: SignalDeclaration) -> Self {
        self.signals.push(signal);
        self
    }

    /// Builder method: append signals from `name` / `name/width` strings
    pub fn with_signal_specs<I, S>(mut self, specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for spec in specs {
            self.signals.push(spec.as_ref().parse()?);
        }
        Ok(self)
    }

    /// Builder method: set the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder method: set the overflow marker policy
    pub fn with_overflow_marker(mut self, marker: OverflowMarker) -> Self {
        self.overflow_marker = marker;
        self
    }

    /// Total payload bits across all signals
    pub fn total_bits(&self) -> u32 {
        self.signals
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.width))
    }

    /// Check the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if !self.frequency_mhz.is_finite() || self.frequency_mhz <= 0.0 {
            return Err(DecoderError::InvalidConfig(format!(
                "sample frequency must be a positive number of MHz, got {}",
                self.frequency_mhz
            )));
        }

        if self.signals.is_empty() {
            return Err(DecoderError::InvalidConfig(
                "at least one signal must be declared".to_string(),
            ));
        }

        if let Some(signal) = self.signals.iter().find(|s| s.width == 0) {
            return Err(DecoderError::InvalidSignalDeclaration(
                signal.name.clone(),
                "width must be at least 1".to_string(),
            ));
        }

        let totbit = self.total_bits();
        if totbit > MAX_PAYLOAD_BITS {
            return Err(DecoderError::InvalidConfig(format!(
                "signals need {} payload bits, at most {} are supported",
                totbit, MAX_PAYLOAD_BITS
            )));
        }

        Ok(())
    }
}
