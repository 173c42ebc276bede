//! Tick to physical time conversion

use crate::types::{DecoderError, Result, Ticks};
use std::fmt;

/// SI prefixes tried in order when scaling a duration for display
const PREFIXES: [&str; 5] = ["", "m", "u", "n", "p"];

/// Significant digits in human-readable durations
const HUMAN_PRECISION: usize = 3;

/// Converts ticks of the sample clock to seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScaler {
    /// Seconds per tick
    period: f64,
}

impl TimeScaler {
    /// Scaler for a sample clock given in MHz
    pub fn from_mhz(frequency_mhz: f64) -> Result<Self> {
        if !frequency_mhz.is_finite() || frequency_mhz <= 0.0 {
            return Err(DecoderError::InvalidConfig(format!(
                "sample frequency must be a positive number of MHz, got {}",
                frequency_mhz
            )));
        }
        Ok(Self {
            period: 1e-6 / frequency_mhz,
        })
    }

    /// Seconds per tick
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Physical time of `ticks` in seconds
    pub fn seconds(&self, ticks: Ticks) -> f64 {
        ticks as f64 * self.period
    }

    /// Physical time of `ticks`, rounded to the nearest picosecond
    pub fn picoseconds(&self, ticks: Ticks) -> u64 {
        Self::seconds_to_picoseconds(self.seconds(ticks))
    }

    /// Round a duration in seconds to the nearest picosecond
    pub fn seconds_to_picoseconds(seconds: f64) -> u64 {
        (seconds * 1e12 + 0.5).floor() as u64
    }

    /// Duration of `ticks` scaled to the largest prefix that keeps it >= 1
    pub fn human(&self, ticks: Ticks) -> HumanTime {
        let mut value = self.seconds(ticks);
        let mut index = 0;
        while value < 1.0 && index + 1 < PREFIXES.len() {
            value *= 1000.0;
            index += 1;
        }
        HumanTime {
            value,
            prefix: PREFIXES[index],
        }
    }
}

/// A duration scaled for display, e.g. `1.5 us`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanTime {
    pub value: f64,
    pub prefix: &'static str,
}

impl fmt::Display for HumanTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}s",
            format_general(self.value, HUMAN_PRECISION),
            self.prefix
        )
    }
}

/// Format like C's `%.<precision>g`
///
/// Rounds to `precision` significant digits, strips trailing zeros, and switches to
/// exponent notation when the exponent is below -4 or at least `precision`.
pub fn format_general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => return scientific.clone(),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(&mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value))
    }
}

fn trim_fraction(number: &str) -> String {
    if number.contains('.') {
        number
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        number.to_string()
    }
}
