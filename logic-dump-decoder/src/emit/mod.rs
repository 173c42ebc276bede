//! Waveform emitters
//!
//! Both output encodings are driven the same way: `on_header` once, then one
//! `on_sample` or `on_overflow` per decoded word that produces output, with `flush`
//! after every word.

use crate::config::{DecoderConfig, OutputFormat};
use crate::timescale::TimeScaler;
use crate::types::{DecoderError, Result, SignalBits, Ticks};
use std::io::Write;

pub mod ascii;
pub mod vcd;

pub use ascii::AsciiEmitter;
pub use vcd::VcdEmitter;

/// Common trait for all output encodings
pub trait WaveformEmitter {
    /// Write the preamble describing the signals
    fn on_header(&mut self) -> Result<()>;

    /// Write the state of every signal at `timestamp`
    fn on_sample(&mut self, fields: &[SignalBits], timestamp: Ticks) -> Result<()>;

    /// Mark `timestamp` as lost to a device buffer overrun
    fn on_overflow(&mut self, timestamp: Ticks) -> Result<()>;

    /// Push buffered output to the sink
    fn flush(&mut self) -> Result<()>;
}

impl<E: WaveformEmitter + ?Sized> WaveformEmitter for Box<E> {
    fn on_header(&mut self) -> Result<()> {
        (**self).on_header()
    }

    fn on_sample(&mut self, fields: &[SignalBits], timestamp: Ticks) -> Result<()> {
        (**self).on_sample(fields, timestamp)
    }

    fn on_overflow(&mut self, timestamp: Ticks) -> Result<()> {
        (**self).on_overflow(timestamp)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Build the emitter selected by `config`, writing to `out`
pub fn create_emitter<W: Write + 'static>(
    config: &DecoderConfig,
    out: W,
) -> Result<Box<dyn WaveformEmitter>> {
    let scaler = TimeScaler::from_mhz(config.frequency_mhz)?;

    match config.format {
        OutputFormat::Vcd => {
            log::debug!("Using VCD emitter ({:?} overflow marker)", config.overflow_marker);
            Ok(Box::new(VcdEmitter::new(
                out,
                &config.signals,
                scaler,
                config.overflow_marker,
            )))
        }
        OutputFormat::Ascii => {
            log::debug!("Using plain-text emitter");
            Ok(Box::new(AsciiEmitter::new(out, &config.signals, scaler)))
        }
    }
}

/// Wrap a sink write failure
pub(crate) fn sink_err(e: std::io::Error) -> DecoderError {
    DecoderError::SinkIo(e)
}
