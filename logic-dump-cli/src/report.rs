//! Run summary report
//!
//! Written as pretty JSON when `--stats` is given, so capture scripts can check for
//! overflows without scraping the log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use logic_dump_decoder::{OutputFormat, RunStats, SignalDeclaration};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::config::RunSettings;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source: String,
    pub output: String,
    pub format: OutputFormat,
    pub frequency_mhz: f64,
    pub signals: Vec<SignalDeclaration>,
    #[serde(flatten)]
    pub stats: RunStats,
}

impl RunSummary {
    pub fn new(settings: &RunSettings, started_at: DateTime<Utc>, stats: RunStats) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            source: settings.source.display().to_string(),
            output: settings.output.display().to_string(),
            format: settings.decoder.format,
            frequency_mhz: settings.decoder.frequency_mhz,
            signals: settings.decoder.signals.clone(),
            stats,
        }
    }
}

/// Write the summary as pretty JSON
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write run summary: {:?}", path))?;
    log::info!("Run summary written to {:?}", path);
    Ok(())
}
