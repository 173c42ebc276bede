//! Standalone capture decoder
//!
//! Decodes a raw capture file (bytes as they came off the sampler) and prints the
//! plain-text trace plus a short summary.
//!
//! Usage:
//!   decode_dump <capture.bin> <MHz> <sig1> [sig2 ...]
//!
//! Example:
//!   decode_dump capture.bin 10 clk data/8 cs

use logic_dump_decoder::{
    AsciiEmitter, DecodedUnit, DecoderConfig, DeviceSource, Session, TimeScaler, WordLayout,
};
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <capture.bin> <MHz> <sig1> [sig2 ...]", args[0]);
        eprintln!("Signals are `name` (1 bit) or `name/n` (n bits)");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let mhz: f64 = match args[2].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Invalid frequency: {}", args[2]);
            std::process::exit(1);
        }
    };

    let config = match DecoderConfig::new()
        .with_frequency_mhz(mhz)
        .with_signal_specs(&args[3..])
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let layout = match WordLayout::from_signals(&config.signals) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!(
        "=== {} signals, {} payload bits, {}-byte words ===",
        config.signals.len(),
        layout.totbit(),
        layout.nbytes()
    );
    println!(
        "Repeat counters cover up to {} ticks; overflow sentinel is {:?}\n",
        layout.max_repeat() + 2,
        layout.encode(&DecodedUnit::Overflow).unwrap_or_default()
    );

    let source = match DeviceSource::open(&path, None) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let scaler = match TimeScaler::from_mhz(mhz) {
        Ok(scaler) => scaler,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let emitter = AsciiEmitter::new(std::io::stdout(), &config.signals, scaler);

    let result = Session::new(&config, source, emitter).and_then(|session| session.run());
    match result {
        Ok(stats) => {
            println!("\n=== DECODING SUMMARY ===");
            println!("Words:         {}", stats.words);
            println!("Samples:       {}", stats.samples);
            println!("Repeat words:  {} ({} idle ticks)", stats.repeat_words, stats.idle_ticks);
            println!("Overflows:     {}", stats.overflows);
            println!("Capture span:  {}", scaler.human(stats.final_timestamp));
        }
        Err(e) => {
            eprintln!("Decode error: {}", e);
            std::process::exit(1);
        }
    }
}
