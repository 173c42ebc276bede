//! Logic Dump Decoder Library
//!
//! Decodes the packed-bit word stream of a logic sampling device and renders it as
//! a waveform trace (VCD or a plain-text column view).
//!
//! # Architecture
//!
//! The pieces run in one synchronous pull loop:
//! - A [`WordSource`] hands out fixed-size words (device node, capture file, stdin)
//! - The [`BitstreamDecoder`] classifies each word (sample, repeat counter, overflow)
//!   and keeps the absolute tick clock
//! - The [`SignalExtractor`] splits sample payloads into per-signal fields
//! - The [`TimeScaler`] turns ticks into physical time
//! - A [`WaveformEmitter`] writes the trace
//!
//! [`Session`] drives the loop. The library does NOT open serial ports with line
//! settings, parse command lines or install a logger; that is the application's job
//! (logic-dump-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use logic_dump_decoder::{create_emitter, open_source, DecoderConfig, Session};
//! use std::path::Path;
//!
//! let config = DecoderConfig::new()
//!     .with_frequency_mhz(10.0)
//!     .with_signal_specs(["clk", "data/3"])
//!     .unwrap();
//!
//! let source = open_source(Path::new("/dev/ttyUSB0"), Some(3_000_000.0)).unwrap();
//! let emitter = create_emitter(&config, std::io::stdout()).unwrap();
//!
//! let stats = Session::new(&config, source, emitter).unwrap().run().unwrap();
//! println!("{} samples decoded", stats.samples);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod emit;
pub mod extractor;
pub mod session;
pub mod sources;
pub mod timescale;
pub mod types;
pub mod word;

// Re-export main types for convenience
pub use config::{DecoderConfig, OutputFormat, OverflowMarker, SignalDeclaration};
pub use decoder::{BitstreamDecoder, Clock, DecodedWords};
pub use emit::{create_emitter, AsciiEmitter, VcdEmitter, WaveformEmitter};
pub use extractor::SignalExtractor;
pub use session::{RunStats, Session};
pub use sources::{open_source, DeviceSource, ReaderSource, StdinSource, WordBuffer, WordSource};
pub use timescale::{HumanTime, TimeScaler};
pub use types::{DecodedUnit, DecodedWord, DecoderError, Result, SignalBits, Ticks};
pub use word::WordLayout;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
