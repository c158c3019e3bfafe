use crate::config::QualityConfig;
use crate::processing::statistics::{half_peak_to_peak, std_dev};

/// Coarse SNR proxy on a 0-100 scale: pulse amplitude over the spread of
/// absolute first differences.
#[derive(Debug, Clone)]
pub struct SignalQualityScorer {
    config: QualityConfig,
}

impl SignalQualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, signal: &[f64]) -> u8 {
        if signal.len() < self.config.min_samples || signal.len() < 2 {
            return 0;
        }

        let noise = difference_noise(signal);
        // NOTE: a flat signal scores 100 even though it usually means no
        // finger on the lens. Kept until the intended convention is confirmed.
        if noise == 0.0 {
            return 100;
        }

        let quality = (self.config.gain * half_peak_to_peak(signal) / noise).round();
        quality.min(100.0) as u8
    }
}

/// Standard deviation of `|x[i] - x[i-1]|`.
pub fn difference_noise(signal: &[f64]) -> f64 {
    let diffs: Vec<f64> = signal.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    std_dev(&diffs)
}
