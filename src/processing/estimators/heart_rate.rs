use super::{Estimate, Rejection};
use crate::config::HeartRateConfig;
use crate::processing::detectors::PeakDetector;

/// Beats per minute from mean peak spacing. Holds the last accepted value
/// whenever a window fails validation.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    config: HeartRateConfig,
    held: Option<u32>,
}

impl HeartRateEstimator {
    pub fn new(config: HeartRateConfig) -> Self {
        Self { config, held: None }
    }

    pub fn held(&self) -> Option<u32> {
        self.held
    }

    pub fn reset(&mut self) {
        self.held = None;
    }

    pub fn estimate(&mut self, signal: &[f64], fps: f64) -> Estimate<u32> {
        if signal.len() < self.config.min_samples {
            return self.hold(Rejection::InsufficientSamples);
        }

        let detector = PeakDetector::for_sample_rate(fps, self.config.refractory_seconds);
        let peaks = detector.detect(signal);
        let bpm = match bpm_from_peaks(&peaks, fps) {
            Some(bpm) => bpm,
            None => return self.hold(Rejection::TooFewPeaks),
        };

        if bpm < self.config.min_bpm || bpm > self.config.max_bpm {
            return self.hold(Rejection::OutOfRange);
        }

        let bpm = bpm.round() as u32;
        self.held = Some(bpm);
        Estimate::Accepted(bpm)
    }

    fn hold(&self, reason: Rejection) -> Estimate<u32> {
        Estimate::Held {
            value: self.held,
            reason,
        }
    }
}

/// `60 * fps / mean inter-peak interval`, `None` with fewer than two peaks.
pub fn bpm_from_peaks(peaks: &[usize], fps: f64) -> Option<f64> {
    if peaks.len() < 2 {
        return None;
    }
    // the mean of consecutive gaps telescopes to (last - first) / (n - 1)
    let span = (peaks[peaks.len() - 1] - peaks[0]) as f64;
    let mean_interval = span / (peaks.len() - 1) as f64;
    Some(60.0 * fps / mean_interval)
}
