//! Logic Dump CLI Application
//!
//! This is the command-line interface for the logic sampler dump decoder.
//! It uses the logic-dump-decoder library and adds:
//! - Argument parsing in the classic `<input> <output> <MHz> <baud> <signals...>` order
//! - An optional TOML configuration file
//! - Logger setup
//! - A JSON run summary

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use logic_dump_decoder::{create_emitter, open_source, OverflowMarker, Session};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, CliOverrides, RunSettings};

/// Path that selects standard output
const STDOUT_PATH: &str = "-";

/// Logic Dump - decode a logic sampler stream into a waveform trace
#[derive(Parser, Debug)]
#[command(name = "logic-dump")]
#[command(about = "Decode a logic sampler stream into a VCD or plain-text trace", long_about = None)]
#[command(version)]
struct Args {
    /// Serial device or capture file to read ('-' for stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Trace file to write ('-' for stdout)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Sample clock frequency in MHz
    #[arg(value_name = "MHZ")]
    mhz: Option<f64>,

    /// Nominal baud rate of the serial link
    #[arg(value_name = "BAUD")]
    baud: Option<f64>,

    /// Signals, first declared in the highest bits: `name` (1 bit) or `name/n` (n bits)
    #[arg(value_name = "SIGNAL")]
    signals: Vec<String>,

    /// Plain-text output (default VCD)
    #[arg(short, long)]
    ascii: bool,

    /// Where VCD output closes an overflow block
    #[arg(long, value_enum, value_name = "POLICY")]
    overflow_marker: Option<MarkerArg>,

    /// Path to configuration file (TOML); command-line values take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long, value_name = "FILE")]
    stats: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MarkerArg {
    /// Twice the overflow time, matching existing traces
    Legacy,
    /// One tick after the overflow
    NextTick,
}

impl From<MarkerArg> for OverflowMarker {
    fn from(arg: MarkerArg) -> Self {
        match arg {
            MarkerArg::Legacy => OverflowMarker::Legacy,
            MarkerArg::NextTick => OverflowMarker::NextTick,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("Logic Dump CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", logic_dump_decoder::VERSION);

    if args.input.is_none() && args.config.is_none() {
        // No arguments - show quick start
        eprintln!("Logic Dump - No input specified");
        eprintln!("\nQuick Start:");
        eprintln!("  logic-dump /dev/ttyUSB0 trace.vcd 10 3000000 clk data/8 cs");
        eprintln!("  logic-dump -a capture.bin - 10 0 clk data/8");
        eprintln!("\nWith a configuration file:");
        eprintln!("  logic-dump --config dump.toml");
        eprintln!("\nUse --help for more options");
        return Ok(());
    }

    let settings = resolve_settings(&args)?;
    decode(&settings)
}

/// Combine the optional config file with the command line
fn resolve_settings(args: &Args) -> Result<RunSettings> {
    let file_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    file_config.resolve(CliOverrides {
        source: args.input.clone(),
        output: args.output.clone(),
        frequency_mhz: args.mhz,
        baud: args.baud,
        signals: args.signals.clone(),
        ascii: args.ascii,
        overflow_marker: args.overflow_marker.map(Into::into),
        stats: args.stats.clone(),
    })
}

/// Open source and sink, then decode until the source ends
fn decode(settings: &RunSettings) -> Result<()> {
    let source = open_source(&settings.source, settings.baud)
        .with_context(|| format!("Cannot read from {:?}", settings.source))?;

    // Only truncate the trace once the source is known to be readable
    let sink = open_sink(&settings.output)?;

    let emitter = create_emitter(&settings.decoder, sink)?;

    let signal_list: Vec<String> = settings
        .decoder
        .signals
        .iter()
        .map(|s| s.to_string())
        .collect();
    log::info!(
        "Decoding {:?} -> {:?} at {} MHz: {}",
        settings.source,
        settings.output,
        settings.decoder.frequency_mhz,
        signal_list.join(" ")
    );

    let started_at = Utc::now();
    let stats = Session::new(&settings.decoder, source, emitter)?
        .run()
        .with_context(|| format!("Decoding {:?} stopped", settings.source))?;

    if stats.overflows > 0 {
        log::warn!(
            "{} device buffer overflow(s); the trace has gaps",
            stats.overflows
        );
    }

    if let Some(path) = &settings.stats {
        report::write_summary(path, &report::RunSummary::new(settings, started_at, stats))?;
    }

    Ok(())
}

/// Open the trace destination
fn open_sink(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == STDOUT_PATH {
        return Ok(Box::new(io::stdout()));
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to open output file: {:?}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    // Overflow warnings must stay visible even when quiet
    let level = if quiet {
        LevelFilter::Warn
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_argument_order() {
        let args = Args::parse_from([
            "logic-dump", "-a", "/dev/ttyUSB0", "-", "10", "3000000", "clk", "data/3",
        ]);
        assert!(args.ascii);
        assert_eq!(args.input, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(args.output, Some(PathBuf::from("-")));
        assert_eq!(args.mhz, Some(10.0));
        assert_eq!(args.baud, Some(3_000_000.0));
        assert_eq!(args.signals, vec!["clk", "data/3"]);

        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.decoder.total_bits(), 4);
    }

    #[test]
    fn test_overflow_marker_flag() {
        let args = Args::parse_from([
            "logic-dump", "--overflow-marker", "next-tick", "in.bin", "out.vcd", "1", "0", "a",
        ]);
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.decoder.overflow_marker, OverflowMarker::NextTick);
    }

    #[test]
    fn test_decode_capture_file_end_to_end() {
        use logic_dump_decoder::{DecodedUnit, WordLayout};

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("capture.bin");
        let output = dir.path().join("trace.vcd");
        let stats = dir.path().join("stats.json");

        let layout = WordLayout::new(4).unwrap();
        let mut bytes = Vec::new();
        for unit in [
            DecodedUnit::Sample(0b1011),
            DecodedUnit::RepeatCount(3),
            DecodedUnit::Overflow,
        ] {
            bytes.extend(layout.encode(&unit).unwrap());
        }
        std::fs::write(&input, bytes).unwrap();

        let argv: Vec<std::ffi::OsString> = vec![
            "logic-dump".into(),
            input.into(),
            output.clone().into(),
            "10".into(),
            "0".into(),
            "clk".into(),
            "data/3".into(),
            "--stats".into(),
            stats.clone().into(),
        ];
        let args = Args::parse_from(argv);
        decode(&resolve_settings(&args).unwrap()).unwrap();

        let trace = std::fs::read_to_string(&output).unwrap();
        assert!(trace.starts_with("$timescale 1ps $end\n"));
        assert!(trace.contains("#0\nb1 !\nb011 \"\n"));
        assert!(trace.ends_with("#600000\nbx !\nbxxx \"\n#1200000\n"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&stats).unwrap()).unwrap();
        assert_eq!(summary["overflows"], 1);
        assert_eq!(summary["final_timestamp"], 7);
    }

    #[test]
    fn test_missing_source_keeps_existing_trace() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trace.vcd");
        std::fs::write(&output, "previous run\n").unwrap();

        let argv: Vec<std::ffi::OsString> = vec![
            "logic-dump".into(),
            dir.path().join("no-such-device").into(),
            output.clone().into(),
            "10".into(),
            "0".into(),
            "clk".into(),
        ];
        let settings = resolve_settings(&Args::parse_from(argv)).unwrap();
        assert!(decode(&settings).is_err());

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run\n");
    }

    #[test]
    fn test_unwritable_output_is_an_error() {
        let args = Args::parse_from([
            "logic-dump", "-", "/nonexistent/dir/trace.vcd", "10", "0", "a",
        ]);
        let settings = resolve_settings(&args).unwrap();
        assert!(decode(&settings).is_err());
    }
}
