use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::error::Result;
use crate::processing::Measurement;

pub const LOG_DIR: &str = "logs";

pub const MEASUREMENT_HEADERS: [&str; 5] = [
    "produced_at",
    "heart_rate_bpm",
    "spo2_percent",
    "signal_quality",
    "is_signal",
];

/// Totals for one finished run, written to the session log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub frames: usize,
    pub measurements: usize,
    pub fps: f64,
    pub last: Option<Measurement>,
}

fn open_append(log_dir: &Path, filename: &str) -> Result<(File, bool)> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(filename);
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok((file, is_new))
}

/// Appends one measurement row to `log_dir/filename`. The header row is
/// written only when the file is created.
pub fn log_measurement(log_dir: &Path, filename: &str, measurement: &Measurement) -> Result<()> {
    let (file, is_new) = open_append(log_dir, filename)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if is_new {
        writer.write_record(MEASUREMENT_HEADERS)?;
    }
    writer.write_record(measurement_row(measurement))?;
    writer.flush()?;
    Ok(())
}

/// Appends a one-line, local-time stamped summary of a run.
pub fn log_session(log_dir: &Path, filename: &str, summary: &SessionSummary) -> Result<()> {
    let (mut file, _) = open_append(log_dir, filename)?;
    let optional = |value: Option<u32>| value.map_or_else(|| "--".to_string(), |v| v.to_string());
    let last = summary.last.as_ref();

    writeln!(
        file,
        "[{}] frames={} measurements={} fps={:.2} hr={} spo2={} quality={}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        summary.frames,
        summary.measurements,
        summary.fps,
        optional(last.and_then(|m| m.heart_rate_bpm)),
        optional(last.and_then(|m| m.spo2_percent)),
        last.map_or_else(|| "--".to_string(), |m| m.signal_quality.to_string()),
    )?;
    file.flush()?;
    Ok(())
}

/// CSV fields for `measurement`; unavailable values are empty.
pub fn measurement_row(measurement: &Measurement) -> [String; 5] {
    let optional = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_default();
    [
        format!("{:.3}", measurement.produced_at),
        optional(measurement.heart_rate_bpm),
        optional(measurement.spo2_percent),
        measurement.signal_quality.to_string(),
        measurement.is_signal.to_string(),
    ]
}
