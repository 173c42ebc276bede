//! Bitstream decoder
//!
//! Classifies each word of the sampler stream as a sample, a repeat counter or the
//! overflow sentinel, and keeps the absolute tick clock. The clock is owned here and
//! only ever moves forward.

use crate::sources::WordSource;
use crate::types::{DecodedUnit, DecodedWord, Result, Ticks};
use crate::word::WordLayout;

/// Running tick count since the start of the capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    timestamp: Ticks,
    saturated: bool,
}

impl Clock {
    /// Current tick
    pub fn timestamp(&self) -> Ticks {
        self.timestamp
    }

    /// Whether the clock has hit `Ticks::MAX`
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    fn advance(&mut self, ticks: Ticks) {
        match self.timestamp.checked_add(ticks) {
            Some(next) => self.timestamp = next,
            None => {
                if !self.saturated {
                    log::warn!(
                        "Tick clock saturated at {}; later timestamps are clamped",
                        Ticks::MAX
                    );
                    self.saturated = true;
                }
                self.timestamp = Ticks::MAX;
            }
        }
    }
}

/// Word classifier and clock keeper
#[derive(Debug, Clone)]
pub struct BitstreamDecoder {
    layout: WordLayout,
    clock: Clock,
}

impl BitstreamDecoder {
    /// Create a decoder starting at tick 0
    pub fn new(layout: WordLayout) -> Self {
        Self {
            layout,
            clock: Clock::default(),
        }
    }

    /// Word layout this decoder reads
    pub fn layout(&self) -> &WordLayout {
        &self.layout
    }

    /// Current clock value (the tick the next word starts at)
    pub fn timestamp(&self) -> Ticks {
        self.clock.timestamp()
    }

    /// Classify a word without touching the clock
    ///
    /// Every bit pattern maps to exactly one unit: the payload is masked to
    /// `totbit` bits, so a tagged word is either a repeat count or the sentinel.
    pub fn classify(&self, word: &[u8]) -> DecodedUnit {
        let raw = self.layout.read(word);
        let payload = raw & self.layout.payload_mask();

        if raw & self.layout.top_bit() == 0 {
            DecodedUnit::Sample(payload)
        } else if payload == self.layout.overflow_value() {
            DecodedUnit::Overflow
        } else {
            DecodedUnit::RepeatCount(payload)
        }
    }

    /// Decode one word and advance the clock
    ///
    /// The returned timestamp is the tick the unit starts at.
    pub fn decode(&mut self, word: &[u8]) -> DecodedWord {
        let unit = self.classify(word);
        let timestamp = self.clock.timestamp();
        self.clock.advance(unit.ticks());

        log::trace!("t={} {} -> t={}", timestamp, unit, self.clock.timestamp());

        DecodedWord { timestamp, unit }
    }

    /// Pull words from a source and decode them lazily
    pub fn words<S: WordSource>(self, source: S) -> DecodedWords<S> {
        DecodedWords {
            source,
            decoder: self,
            finished: false,
        }
    }
}

/// Iterator that fetches and decodes words until the source ends
///
/// Yields `Err` once on a source failure and then stops.
pub struct DecodedWords<S> {
    source: S,
    decoder: BitstreamDecoder,
    finished: bool,
}

impl<S: WordSource> DecodedWords<S> {
    /// The decoder (and its clock) behind this iterator
    pub fn decoder(&self) -> &BitstreamDecoder {
        &self.decoder
    }
}

impl<S: WordSource> Iterator for DecodedWords<S> {
    type Item = Result<DecodedWord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let nbytes = self.decoder.layout().nbytes();
        match self.source.fetch(nbytes) {
            Ok(Some(word)) => Some(Ok(self.decoder.decode(word))),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
