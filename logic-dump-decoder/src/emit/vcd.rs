//! Value Change Dump output
//!
//! Every sample is written in full (all signals, every time) with picosecond
//! timestamps. Identifiers are single printable characters starting at `!`.

use super::{sink_err, WaveformEmitter};
use crate::config::{OverflowMarker, SignalDeclaration};
use crate::timescale::TimeScaler;
use crate::types::{Result, SignalBits, Ticks};
use std::io::Write;

/// First identifier character
const ID_BASE: u8 = b'!';

/// Scope all signals are declared in
const SCOPE_NAME: &str = "logic";

struct VcdVar {
    name: String,
    width: u32,
    id: char,
}

/// VCD emitter
pub struct VcdEmitter<W: Write> {
    out: W,
    vars: Vec<VcdVar>,
    scaler: TimeScaler,
    overflow_marker: OverflowMarker,
}

impl<W: Write> VcdEmitter<W> {
    pub fn new(
        out: W,
        signals: &[SignalDeclaration],
        scaler: TimeScaler,
        overflow_marker: OverflowMarker,
    ) -> Self {
        let vars = signals
            .iter()
            .enumerate()
            .map(|(i, s)| VcdVar {
                name: s.name.clone(),
                width: s.width,
                id: identifier(i),
            })
            .collect();

        Self {
            out,
            vars,
            scaler,
            overflow_marker,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_time(&mut self, picoseconds: u64) -> Result<()> {
        writeln!(self.out, "#{}", picoseconds).map_err(sink_err)
    }
}

/// Identifier for the signal at `index`
fn identifier(index: usize) -> char {
    char::from(ID_BASE.saturating_add(index.min(u8::MAX as usize) as u8))
}

impl<W: Write> WaveformEmitter for VcdEmitter<W> {
    fn on_header(&mut self) -> Result<()> {
        writeln!(self.out, "$timescale 1ps $end").map_err(sink_err)?;
        writeln!(self.out, "$scope module {} $end", SCOPE_NAME).map_err(sink_err)?;
        for var in &self.vars {
            writeln!(
                self.out,
                "$var wire {} {} {} $end",
                var.width, var.id, var.name
            )
            .map_err(sink_err)?;
        }
        writeln!(self.out, "$upscope $end").map_err(sink_err)?;
        writeln!(self.out, "$dumpvars").map_err(sink_err)
    }

    fn on_sample(&mut self, fields: &[SignalBits], timestamp: Ticks) -> Result<()> {
        let ps = self.scaler.picoseconds(timestamp);
        self.write_time(ps)?;

        for (var, field) in self.vars.iter().zip(fields) {
            writeln!(self.out, "b{} {}", field, var.id).map_err(sink_err)?;
        }
        Ok(())
    }

    fn on_overflow(&mut self, timestamp: Ticks) -> Result<()> {
        let ps = self.scaler.picoseconds(timestamp);
        self.write_time(ps)?;

        for var in &self.vars {
            let unknown = "x".repeat(var.width as usize);
            writeln!(self.out, "b{} {}", unknown, var.id).map_err(sink_err)?;
        }

        let closing = match self.overflow_marker {
            // Existing traces put this at twice the overflow time, not one tick later
            OverflowMarker::Legacy => {
                TimeScaler::seconds_to_picoseconds(2.0 * self.scaler.seconds(timestamp))
            }
            OverflowMarker::NextTick => self.scaler.picoseconds(timestamp.saturating_add(1)),
        };
        self.write_time(closing)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(sink_err)
    }
}
