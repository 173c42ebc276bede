//! Signal field extraction
//!
//! Splits a sample payload into per-signal fields. The first declared signal owns
//! the highest payload bits; each following signal sits directly below the previous
//! one, so with `["clk", "data/3"]` the 4-bit payload reads `[clk][d2][d1][d0]`.

use crate::config::SignalDeclaration;
use crate::types::SignalBits;

/// Payload splitter for a fixed signal list
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    widths: Vec<u32>,
    totbit: u32,
}

impl SignalExtractor {
    pub fn new(signals: &[SignalDeclaration]) -> Self {
        let widths: Vec<u32> = signals.iter().map(|s| s.width).collect();
        let totbit: u32 = widths.iter().sum();
        Self { widths, totbit }
    }

    /// Split `payload` into one field per signal, in declared order
    pub fn extract(&self, payload: u64) -> Vec<SignalBits> {
        let mut fields = Vec::with_capacity(self.widths.len());
        self.extract_into(payload, &mut fields);
        fields
    }

    /// Same as [`extract`](Self::extract), reusing `fields`
    pub fn extract_into(&self, payload: u64, fields: &mut Vec<SignalBits>) {
        fields.clear();

        let mut cursor = self.totbit;
        for &width in &self.widths {
            // Signal occupies bits [cursor - width, cursor)
            let low = cursor - width;
            let value = (payload >> low) & Self::mask(width);
            fields.push(SignalBits::new(value, width));
            cursor = low;
        }
    }

    fn mask(width: u32) -> u64 {
        if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }
}
