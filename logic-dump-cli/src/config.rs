//! Run configuration: TOML file plus command-line overrides

use anyhow::{bail, Context, Result};
use logic_dump_decoder::{DecoderConfig, OutputFormat, OverflowMarker, SignalDeclaration};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Serial device, capture file, or `-` for stdin
    pub source: Option<PathBuf>,
    /// Nominal baud rate of the link
    pub baud: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureConfig {
    pub frequency_mhz: Option<f64>,
    #[serde(default)]
    pub signals: Vec<SignalDeclaration>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Trace file, or `-` for stdout
    pub path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub overflow_marker: Option<OverflowMarker>,
    /// Where to write the JSON run summary
    pub stats: Option<PathBuf>,
}

/// Values given on the command line; each one wins over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub frequency_mhz: Option<f64>,
    pub baud: Option<f64>,
    pub signals: Vec<String>,
    pub ascii: bool,
    pub overflow_marker: Option<OverflowMarker>,
    pub stats: Option<PathBuf>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source: PathBuf,
    pub output: PathBuf,
    pub baud: Option<f64>,
    pub stats: Option<PathBuf>,
    pub decoder: DecoderConfig,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

impl AppConfig {
    /// Merge with command-line values and validate the result
    pub fn resolve(self, cli: CliOverrides) -> Result<RunSettings> {
        let Some(source) = cli.source.or(self.input.source) else {
            bail!("No input given (device, capture file or '-' for stdin)");
        };
        let Some(output) = cli.output.or(self.output.path) else {
            bail!("No output given (file or '-' for stdout)");
        };
        let Some(frequency_mhz) = cli.frequency_mhz.or(self.capture.frequency_mhz) else {
            bail!("No sample clock frequency given");
        };

        let signals = if cli.signals.is_empty() {
            self.capture.signals
        } else {
            cli.signals
                .iter()
                .map(|s| s.parse::<SignalDeclaration>())
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        let format = if cli.ascii {
            OutputFormat::Ascii
        } else {
            self.output.format.unwrap_or_default()
        };

        let decoder = DecoderConfig {
            signals,
            frequency_mhz,
            format,
            overflow_marker: cli
                .overflow_marker
                .or(self.output.overflow_marker)
                .unwrap_or_default(),
        };
        decoder.validate().context("Invalid run configuration")?;

        Ok(RunSettings {
            source,
            output,
            baud: cli.baud.or(self.input.baud),
            stats: cli.stats.or(self.output.stats),
            decoder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
        [input]
        source = "/dev/ttyUSB0"
        baud = 3000000

        [capture]
        frequency_mhz = 10.0
        signals = ["clk", "data/8", "cs"]

        [output]
        path = "trace.vcd"
        overflow_marker = "next-tick"
    "#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.input.source, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(config.input.baud, Some(3_000_000.0));
        assert_eq!(config.capture.signals.len(), 3);
        assert_eq!(config.capture.signals[1], SignalDeclaration::new("data", 8));
        assert_eq!(config.output.overflow_marker, Some(OverflowMarker::NextTick));
    }

    #[test]
    fn test_bad_signal_in_file_is_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str(
            r#"
            [capture]
            signals = ["data/0"]
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_file_only_resolution() {
        let config: AppConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        let settings = config.resolve(CliOverrides::default()).unwrap();
        assert_eq!(settings.output, PathBuf::from("trace.vcd"));
        assert_eq!(settings.decoder.format, OutputFormat::Vcd);
        assert_eq!(settings.decoder.total_bits(), 10);
        assert_eq!(settings.baud, Some(3_000_000.0));
    }

    #[test]
    fn test_command_line_wins() {
        let config: AppConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        let settings = config
            .resolve(CliOverrides {
                output: Some(PathBuf::from("-")),
                frequency_mhz: Some(48.0),
                signals: vec!["a".to_string(), "b/2".to_string()],
                ascii: true,
                overflow_marker: Some(OverflowMarker::Legacy),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(settings.source, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(settings.output, PathBuf::from("-"));
        assert_eq!(settings.decoder.frequency_mhz, 48.0);
        assert_eq!(settings.decoder.signals.len(), 2);
        assert_eq!(settings.decoder.format, OutputFormat::Ascii);
        assert_eq!(settings.decoder.overflow_marker, OverflowMarker::Legacy);
    }

    #[test]
    fn test_missing_values_are_errors() {
        let no_input = AppConfig::default().resolve(CliOverrides::default());
        assert!(no_input.is_err());

        let zero_frequency = AppConfig::default().resolve(CliOverrides {
            source: Some(PathBuf::from("-")),
            output: Some(PathBuf::from("-")),
            frequency_mhz: Some(0.0),
            signals: vec!["a".to_string()],
            ..Default::default()
        });
        assert!(zero_frequency.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.toml");
        fs::write(&path, SAMPLE_CONFIG).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.capture.frequency_mhz, Some(10.0));

        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
