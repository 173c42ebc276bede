//! Decode session - the single pull loop tying source, decoder and emitter together
//!
//! Each step fetches one word, decodes it, dispatches at most one output action and
//! flushes the emitter, so an abrupt stop loses at most the word in flight.

use crate::config::DecoderConfig;
use crate::decoder::{BitstreamDecoder, DecodedWords};
use crate::emit::WaveformEmitter;
use crate::extractor::SignalExtractor;
use crate::sources::WordSource;
use crate::timescale::TimeScaler;
use crate::types::{DecodedUnit, Result, SignalBits, Ticks};
use crate::word::WordLayout;
use serde::Serialize;

/// Counters collected over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Words read from the source
    pub words: u64,
    /// Sample words emitted
    pub samples: u64,
    /// Repeat-counter words seen
    pub repeat_words: u64,
    /// Ticks covered by repeat counters
    pub idle_ticks: u64,
    /// Overflow sentinels seen
    pub overflows: u64,
    /// Clock value after the last word
    pub final_timestamp: Ticks,
    /// `final_timestamp` in seconds of capture time
    pub capture_seconds: f64,
}

/// One decode run over a source
pub struct Session<S: WordSource, E: WaveformEmitter> {
    words: DecodedWords<S>,
    extractor: SignalExtractor,
    emitter: E,
    scaler: TimeScaler,
    fields: Vec<SignalBits>,
    stats: RunStats,
}

impl<S: WordSource, E: WaveformEmitter> Session<S, E> {
    /// Validate `config` and set up a session reading `source` into `emitter`
    pub fn new(config: &DecoderConfig, source: S, emitter: E) -> Result<Self> {
        config.validate()?;

        let layout = WordLayout::from_signals(&config.signals)?;
        let scaler = TimeScaler::from_mhz(config.frequency_mhz)?;

        log::debug!(
            "{} signals, {} payload bits, {}-byte words, period {:e} s",
            config.signals.len(),
            layout.totbit(),
            layout.nbytes(),
            scaler.period()
        );

        Ok(Self {
            words: BitstreamDecoder::new(layout).words(source),
            extractor: SignalExtractor::new(&config.signals),
            emitter,
            scaler,
            fields: Vec::with_capacity(config.signals.len()),
            stats: RunStats::default(),
        })
    }

    /// Counters so far
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Write the header, then decode until end-of-stream
    ///
    /// A source or sink failure ends the run with an error; whatever was already
    /// written stays in the sink.
    pub fn run(mut self) -> Result<RunStats> {
        self.emitter.on_header()?;
        self.emitter.flush()?;

        while self.step()? {}

        log::info!(
            "End of stream: {} words, {} samples, {} overflows, {} captured",
            self.stats.words,
            self.stats.samples,
            self.stats.overflows,
            self.scaler.human(self.stats.final_timestamp)
        );

        Ok(self.stats)
    }

    /// Process one word; returns false once the source is exhausted
    pub fn step(&mut self) -> Result<bool> {
        let Some(decoded) = self.words.next().transpose()? else {
            return Ok(false);
        };

        self.stats.words += 1;
        let timestamp = decoded.timestamp;

        match decoded.unit {
            DecodedUnit::Sample(payload) => {
                self.extractor.extract_into(payload, &mut self.fields);
                self.emitter.on_sample(&self.fields, timestamp)?;
                self.stats.samples += 1;
            }
            DecodedUnit::RepeatCount(n) => {
                self.stats.repeat_words += 1;
                self.stats.idle_ticks = self.stats.idle_ticks.saturating_add(n + 2);
            }
            DecodedUnit::Overflow => {
                log::warn!(
                    "Device buffer overflow at tick {} ({}): sample data lost",
                    timestamp,
                    self.scaler.human(timestamp)
                );
                self.emitter.on_overflow(timestamp)?;
                self.stats.overflows += 1;
            }
        }

        self.stats.final_timestamp = self.words.decoder().timestamp();
        self.stats.capture_seconds = self.scaler.seconds(self.stats.final_timestamp);
        self.emitter.flush()?;

        Ok(true)
    }

    /// Take back the emitter (and its sink)
    pub fn into_emitter(self) -> E {
        self.emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalDeclaration;
    use crate::sources::ReaderSource;
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::sync::{Mutex, Once};
    use std::thread::{self, ThreadId};

    /// Process-wide logger keeping records per test thread
    struct CaptureLog;

    static RECORDS: Mutex<Vec<(ThreadId, Level, String)>> = Mutex::new(Vec::new());
    static LOGGER: CaptureLog = CaptureLog;
    static INSTALL: Once = Once::new();

    impl Log for CaptureLog {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut records) = RECORDS.lock() {
                records.push((
                    thread::current().id(),
                    record.level(),
                    record.args().to_string(),
                ));
            }
        }

        fn flush(&self) {}
    }

    /// Run `f` and return the warnings it logged on this thread
    fn warnings_from<F: FnOnce()>(f: F) -> Vec<String> {
        INSTALL.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Trace);
        });

        f();

        let id = thread::current().id();
        RECORDS
            .lock()
            .unwrap()
            .iter()
            .filter(|(thread, level, _)| *thread == id && *level == Level::Warn)
            .map(|(_, _, message)| message.clone())
            .collect()
    }

    /// Emitter that records calls instead of rendering them
    #[derive(Default)]
    struct Recorder {
        headers: usize,
        samples: Vec<(Ticks, Vec<SignalBits>)>,
        overflows: Vec<Ticks>,
        flushes: usize,
    }

    impl WaveformEmitter for Recorder {
        fn on_header(&mut self) -> Result<()> {
            self.headers += 1;
            Ok(())
        }

        fn on_sample(&mut self, fields: &[SignalBits], timestamp: Ticks) -> Result<()> {
            self.samples.push((timestamp, fields.to_vec()));
            Ok(())
        }

        fn on_overflow(&mut self, timestamp: Ticks) -> Result<()> {
            self.overflows.push(timestamp);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn config() -> DecoderConfig {
        DecoderConfig::new()
            .with_frequency_mhz(10.0)
            .add_signal(SignalDeclaration::bit("clk"))
            .add_signal(SignalDeclaration::new("data", 3))
    }

    #[test]
    fn test_dispatches_one_action_per_word() {
        let layout = WordLayout::new(4).unwrap();
        let mut stream = Vec::new();
        stream.extend(layout.encode_sample(0b1011));
        stream.extend(layout.encode_repeat(3).unwrap());
        stream.extend(layout.encode_sample(0b0100));
        stream.extend(layout.encode_overflow());

        let mut session = Session::new(
            &config(),
            ReaderSource::new(stream.as_slice()),
            Recorder::default(),
        )
        .unwrap();
        while session.step().unwrap() {}

        let stats = session.stats().clone();
        assert_eq!(stats.words, 4);
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.repeat_words, 1);
        assert_eq!(stats.idle_ticks, 5);
        assert_eq!(stats.overflows, 1);
        assert_eq!(stats.final_timestamp, 8);

        let recorder = session.into_emitter();
        assert_eq!(recorder.headers, 0);
        assert_eq!(recorder.flushes, 4);
        assert_eq!(recorder.samples[0].0, 0);
        assert_eq!(recorder.samples[1].0, 6);
        assert_eq!(
            recorder.samples[1].1,
            vec![SignalBits::new(0, 1), SignalBits::new(0b100, 3)]
        );
        assert_eq!(recorder.overflows, vec![7]);
    }

    #[test]
    fn test_run_writes_header_and_ends_cleanly() {
        let empty: &[u8] = &[];
        let stats = Session::new(&config(), ReaderSource::new(empty), Recorder::default())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(stats, RunStats::default());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let empty: &[u8] = &[];
        let bad = config().with_frequency_mhz(0.0);
        assert!(Session::new(&bad, ReaderSource::new(empty), Recorder::default()).is_err());
    }

    #[test]
    fn test_each_overflow_logs_one_warning() {
        let layout = WordLayout::new(4).unwrap();
        let mut stream = Vec::new();
        stream.extend(layout.encode_overflow());
        stream.extend(layout.encode_sample(0b1000));
        stream.extend(layout.encode_repeat(2).unwrap());
        stream.extend(layout.encode_overflow());

        let warnings = warnings_from(|| {
            let stats = Session::new(
                &config(),
                ReaderSource::new(stream.as_slice()),
                Recorder::default(),
            )
            .unwrap()
            .run()
            .unwrap();
            assert_eq!(stats.overflows, 2);
        });

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("tick 0"));
        assert!(warnings[1].contains("tick 6"));
    }

    #[test]
    fn test_idle_ticks_and_clock_saturate_on_widest_payload() {
        let wide = DecoderConfig::new()
            .with_frequency_mhz(10.0)
            .add_signal(SignalDeclaration::new("bus", 63));
        let layout = WordLayout::from_signals(&wide.signals).unwrap();
        let mut stream = Vec::new();
        stream.extend(layout.encode_repeat(layout.max_repeat()).unwrap());
        stream.extend(layout.encode_repeat(layout.max_repeat()).unwrap());
        stream.extend(layout.encode_sample(1));
        stream.extend(layout.encode_sample(2));

        let mut session = Session::new(
            &wide,
            ReaderSource::new(stream.as_slice()),
            Recorder::default(),
        )
        .unwrap();
        let warnings = warnings_from(|| {
            while session.step().unwrap() {}
        });

        let stats = session.stats().clone();
        assert_eq!(stats.words, 4);
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.idle_ticks, Ticks::MAX);
        assert_eq!(stats.final_timestamp, Ticks::MAX);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("saturated"));

        let recorder = session.into_emitter();
        assert_eq!(recorder.samples[0].0, Ticks::MAX);
        assert_eq!(recorder.samples[1].1, vec![SignalBits::new(2, 63)]);
    }
}
