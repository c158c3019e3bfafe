use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::processing::{Measurement, Pipeline, RawSample};
use crate::utils::log::{measurement_row, MEASUREMENT_HEADERS};

/// One recorded frame: `timestamp,red,green` with channel means in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub timestamp: f64,
    pub red: f64,
    pub green: f64,
}

impl From<SampleRecord> for RawSample {
    fn from(record: SampleRecord) -> Self {
        RawSample {
            red_mean: record.red,
            green_mean: record.green,
            timestamp: record.timestamp,
        }
    }
}

impl From<RawSample> for SampleRecord {
    fn from(sample: RawSample) -> Self {
        SampleRecord {
            timestamp: sample.timestamp,
            red: sample.red_mean,
            green: sample.green_mean,
        }
    }
}

pub struct ReplaySummary {
    pub frames: usize,
    pub fps: f64,
    pub measurements: Vec<Measurement>,
}

pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<RawSample>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut samples = Vec::new();
    for record in reader.deserialize::<SampleRecord>() {
        samples.push(record?.into());
    }
    Ok(samples)
}

pub fn write_samples<P: AsRef<Path>>(path: P, samples: &[RawSample]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for &sample in samples {
        writer.serialize(SampleRecord::from(sample))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_measurements<P: AsRef<Path>>(path: P, measurements: &[Measurement]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(MEASUREMENT_HEADERS)?;
    for measurement in measurements {
        writer.write_record(measurement_row(measurement))?;
    }
    writer.flush()?;
    Ok(())
}

/// Replays a recorded session through a fresh pipeline and writes every
/// measurement it produces to `output_path`.
pub fn run<P, Q>(config: Config, input_path: P, output_path: Q) -> Result<ReplaySummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let samples = read_samples(&input_path)?;
    let mut pipeline = Pipeline::new(config)?;
    pipeline.start();

    let start_time = Instant::now();
    let measurements: Vec<Measurement> = samples
        .iter()
        .filter_map(|&sample| pipeline.process_sample(sample))
        .collect();
    let duration = start_time.elapsed();

    info!(
        frames = samples.len(),
        measurements = measurements.len(),
        ?duration,
        "replay complete"
    );

    write_measurements(&output_path, &measurements)?;
    let fps = pipeline.fps();
    pipeline.stop();

    Ok(ReplaySummary {
        frames: samples.len(),
        fps,
        measurements,
    })
}
