// src/config/mod.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PpgError, Result};
use crate::processing::extractor::Region;
use crate::visualization::PlotConfig;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub extractor: ExtractorConfig,
    pub pipeline: PipelineConfig,
    pub heart_rate: HeartRateConfig,
    pub spo2: Spo2Config,
    pub quality: QualityConfig,
    pub plot: PlotConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    pub region: Region,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            region: Region::CenterSquare { fraction: 0.25 },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames per detrend window.
    pub window_length: usize,
    /// Capacity of the raw and processed channel buffers.
    pub buffer_capacity: usize,
    /// Raw and processed samples required before measuring.
    pub min_population: usize,
    pub nominal_fps: f64,
    /// Derive fps from frame timestamps instead of trusting `nominal_fps`.
    pub estimate_fps: bool,
    pub warmup_frames: usize,
    pub smoothing_half_width: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_length: 300,
            buffer_capacity: 256,
            min_population: 90,
            nominal_fps: 30.0,
            estimate_fps: true,
            warmup_frames: 0,
            smoothing_half_width: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HeartRateConfig {
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Minimum time between accepted peaks.
    pub refractory_seconds: f64,
    pub min_samples: usize,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            min_bpm: 40.0,
            max_bpm: 200.0,
            refractory_seconds: 0.3,
            min_samples: 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Spo2Config {
    pub intercept: f64,
    pub slope: f64,
    pub min_percent: f64,
    pub max_percent: f64,
    /// Weight of the new estimate in the exponential moving average.
    pub smoothing_alpha: f64,
    pub min_samples: usize,
}

impl Default for Spo2Config {
    fn default() -> Self {
        Self {
            intercept: 110.0,
            slope: 25.0,
            min_percent: 70.0,
            max_percent: 100.0,
            smoothing_alpha: 0.3,
            min_samples: 90,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct QualityConfig {
    pub min_samples: usize,
    pub gain: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_samples: 30,
            gain: 20.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub enable_measurement_log: bool,
    pub measurement_file: String,
    /// Append a one-line summary per run to `session_file`.
    pub enable_session_log: bool,
    pub session_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            enable_measurement_log: false,
            measurement_file: "measurements.csv".to_string(),
            enable_session_log: false,
            session_file: "sessions.log".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if pipeline.window_length < 2 {
            return invalid("pipeline.window_length must be at least 2");
        }
        if pipeline.buffer_capacity == 0 {
            return invalid("pipeline.buffer_capacity must be positive");
        }
        if pipeline.min_population == 0 || pipeline.min_population > pipeline.buffer_capacity {
            return invalid("pipeline.min_population must be in 1..=buffer_capacity");
        }
        if !(pipeline.nominal_fps > 0.0) {
            return invalid("pipeline.nominal_fps must be positive");
        }
        if pipeline.smoothing_half_width == Some(0) {
            return invalid("pipeline.smoothing_half_width must be positive when set");
        }

        let hr = &self.heart_rate;
        if !(hr.min_bpm > 0.0 && hr.min_bpm < hr.max_bpm) {
            return invalid("heart_rate.min_bpm must be positive and below max_bpm");
        }
        if !(hr.refractory_seconds > 0.0) {
            return invalid("heart_rate.refractory_seconds must be positive");
        }

        let spo2 = &self.spo2;
        if !(spo2.min_percent < spo2.max_percent) {
            return invalid("spo2.min_percent must be below max_percent");
        }
        if !(spo2.smoothing_alpha > 0.0 && spo2.smoothing_alpha <= 1.0) {
            return invalid("spo2.smoothing_alpha must be in (0, 1]");
        }

        if self.plot.max_points == 0 {
            return invalid("plot.max_points must be positive");
        }

        if let Region::CenterSquare { fraction } = self.extractor.region {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return invalid("extractor.region fraction must be in (0, 1]");
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(PpgError::InvalidConfig(message.to_string()))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config_str = fs::read_to_string(path).map_err(PpgError::ConfigRead)?;

    let config: Config = serde_yaml::from_str(&config_str).map_err(PpgError::ConfigParse)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config).map_err(PpgError::ConfigSerialize)?;

    fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let yaml = "pipeline:\n  window_length: 150\nextractor:\n  region: full_frame\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pipeline.window_length, 150);
        assert_eq!(config.pipeline.buffer_capacity, 256);
        assert_eq!(config.extractor.region, Region::FullFrame);
        assert_eq!(config.spo2, Spo2Config::default());
    }

    #[test]
    fn save_then_load_preserves_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ppg.yaml");

        let mut config = Config::default();
        config.pipeline.smoothing_half_width = Some(5);
        config.extractor.region = Region::CenterSquare { fraction: 0.5 };

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn rejects_degenerate_window() {
        let mut config = Config::default();
        config.pipeline.window_length = 1;
        assert!(matches!(
            config.validate(),
            Err(PpgError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_alpha_and_fraction() {
        let mut config = Config::default();
        config.spo2.smoothing_alpha = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extractor.region = Region::CenterSquare { fraction: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = load_config("/nonexistent/ppg.yaml");
        assert!(matches!(result, Err(PpgError::ConfigRead(_))));
    }
}
