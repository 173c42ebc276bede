//! Column-aligned plain-text trace
//!
//! One line per sample: a 20-character time column, then one `*` (set) or `-`
//! (clear) per bit for each signal. When ticks were skipped, the line is preceded by
//! a `+<gap>` line and carries the absolute time in the time column. Signal names
//! are written vertically above their first bit, bottom-aligned.

use super::{sink_err, WaveformEmitter};
use crate::config::SignalDeclaration;
use crate::timescale::TimeScaler;
use crate::types::{Result, SignalBits, Ticks};
use std::io::Write;

/// Width of the leading time column
pub const TIME_COLUMN: usize = 20;

/// Plain-text emitter
pub struct AsciiEmitter<W: Write> {
    out: W,
    signals: Vec<SignalDeclaration>,
    scaler: TimeScaler,
    last_timestamp: Ticks,
}

impl<W: Write> AsciiEmitter<W> {
    pub fn new(out: W, signals: &[SignalDeclaration], scaler: TimeScaler) -> Self {
        Self {
            out,
            signals: signals.to_vec(),
            scaler,
            last_timestamp: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_blank_time(&mut self) -> Result<()> {
        write!(self.out, "{:width$}", "", width = TIME_COLUMN).map_err(sink_err)
    }
}

impl<W: Write> WaveformEmitter for AsciiEmitter<W> {
    fn on_header(&mut self) -> Result<()> {
        let names: Vec<Vec<char>> = self
            .signals
            .iter()
            .map(|s| s.name.chars().collect())
            .collect();
        let rows = names.iter().map(Vec::len).max().unwrap_or(0);

        for row in 0..rows {
            self.write_blank_time()?;
            for (name, signal) in names.iter().zip(&self.signals) {
                // Shorter names start further down so all names end on the last row
                let c = (row + name.len())
                    .checked_sub(rows)
                    .and_then(|i| name.get(i))
                    .copied()
                    .unwrap_or(' ');
                write!(
                    self.out,
                    "{}{:width$}",
                    c,
                    "",
                    width = signal.width as usize
                )
                .map_err(sink_err)?;
            }
            writeln!(self.out).map_err(sink_err)?;
        }

        writeln!(self.out).map_err(sink_err)
    }

    fn on_sample(&mut self, fields: &[SignalBits], timestamp: Ticks) -> Result<()> {
        if self.last_timestamp.checked_add(1) != Some(timestamp) {
            let gap = self.scaler.human(timestamp.saturating_sub(self.last_timestamp));
            let now = self.scaler.human(timestamp);
            writeln!(
                self.out,
                "+{:<width$}",
                gap.to_string(),
                width = TIME_COLUMN - 1
            )
            .map_err(sink_err)?;
            write!(self.out, "{:<width$}", now.to_string(), width = TIME_COLUMN)
                .map_err(sink_err)?;
        } else {
            self.write_blank_time()?;
        }
        self.last_timestamp = timestamp;

        for field in fields {
            let column: String = field.bits().map(|b| if b { '*' } else { '-' }).collect();
            write!(self.out, "{} ", column).map_err(sink_err)?;
        }
        writeln!(self.out).map_err(sink_err)
    }

    fn on_overflow(&mut self, _timestamp: Ticks) -> Result<()> {
        writeln!(self.out, "OVERFLOW").map_err(sink_err)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(sink_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter(specs: &[&str]) -> AsciiEmitter<Vec<u8>> {
        let signals: Vec<SignalDeclaration> = specs.iter().map(|s| s.parse().unwrap()).collect();
        AsciiEmitter::new(Vec::new(), &signals, TimeScaler::from_mhz(10.0).unwrap())
    }

    fn output(emitter: AsciiEmitter<Vec<u8>>) -> String {
        String::from_utf8(emitter.into_inner()).unwrap()
    }

    fn blank() -> String {
        " ".repeat(TIME_COLUMN)
    }

    #[test]
    fn test_header_bottom_aligns_names() {
        let mut txt = emitter(&["clk", "d/2"]);
        txt.on_header().unwrap();
        let expected = format!("{b}c    \n{b}l    \n{b}k d  \n\n", b = blank());
        assert_eq!(output(txt), expected);
    }

    #[test]
    fn test_adjacent_samples_use_blank_time_column() {
        let mut txt = emitter(&["clk", "data/3"]);
        txt.last_timestamp = 4;
        txt.on_sample(&[SignalBits::new(1, 1), SignalBits::new(0b011, 3)], 5)
            .unwrap();
        assert_eq!(output(txt), format!("{}* -** \n", blank()));
    }

    #[test]
    fn test_gap_prints_interval_and_absolute_time() {
        let mut txt = emitter(&["a"]);
        txt.last_timestamp = 1;
        txt.on_sample(&[SignalBits::new(0, 1)], 6).unwrap();
        assert_eq!(
            output(txt),
            format!("+{:<19}\n{:<20}- \n", "500 ns", "600 ns")
        );
    }

    #[test]
    fn test_first_sample_at_tick_zero_shows_gap() {
        let mut txt = emitter(&["a"]);
        txt.on_sample(&[SignalBits::new(1, 1)], 0).unwrap();
        assert_eq!(output(txt), format!("+{:<19}\n{:<20}* \n", "0 ps", "0 ps"));
    }

    #[test]
    fn test_overflow_line() {
        let mut txt = emitter(&["a"]);
        txt.on_overflow(3).unwrap();
        assert_eq!(output(txt), "OVERFLOW\n");
    }
}
