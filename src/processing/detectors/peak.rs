use crate::processing::statistics::percentile;

/// Fraction of the 75th percentile used as the peak amplitude floor.
const THRESHOLD_SCALE: f64 = 0.5;
const THRESHOLD_PERCENTILE: f64 = 0.75;

/// Local-maximum detector with an adaptive amplitude threshold and a
/// refractory spacing between accepted peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakDetector {
    min_distance: usize,
}

impl PeakDetector {
    pub fn new(min_distance: usize) -> Self {
        Self {
            min_distance: min_distance.max(1),
        }
    }

    /// Spacing of `refractory_seconds` at `fps`, e.g. 0.3 s at 30 fps is 9
    /// samples (a 200 BPM ceiling).
    pub fn for_sample_rate(fps: f64, refractory_seconds: f64) -> Self {
        Self::new((refractory_seconds * fps).round() as usize)
    }

    pub fn min_distance(&self) -> usize {
        self.min_distance
    }

    /// Half the 75th-percentile order statistic of `signal`.
    pub fn threshold(signal: &[f64]) -> f64 {
        THRESHOLD_SCALE * percentile(signal, THRESHOLD_PERCENTILE)
    }

    /// Indices of accepted peaks in ascending order. Fewer than two peaks
    /// means no usable periodicity.
    pub fn detect(&self, signal: &[f64]) -> Vec<usize> {
        let mut peaks: Vec<usize> = Vec::new();
        if signal.len() < 3 {
            return peaks;
        }

        let threshold = Self::threshold(signal);
        for i in 1..signal.len() - 1 {
            let is_peak =
                signal[i] > signal[i - 1] && signal[i] > signal[i + 1] && signal[i] > threshold;
            if !is_peak {
                continue;
            }
            match peaks.last() {
                Some(&last) if i - last < self.min_distance => {}
                _ => peaks.push(i),
            }
        }
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq_hz: f64, fps: f64, len: usize, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / fps + phase).sin())
            .collect()
    }

    #[test]
    fn refractory_distance_scales_with_fps() {
        assert_eq!(PeakDetector::for_sample_rate(30.0, 0.3).min_distance(), 9);
        assert_eq!(PeakDetector::for_sample_rate(60.0, 0.3).min_distance(), 18);
        assert_eq!(PeakDetector::for_sample_rate(1.0, 0.3).min_distance(), 1);
    }

    #[test]
    fn finds_one_peak_per_period() {
        let signal = sine(1.2, 30.0, 256, 0.0);
        let peaks = PeakDetector::new(9).detect(&signal);
        assert_eq!(peaks.len(), 10);
        for pair in peaks.windows(2) {
            assert_eq!(pair[1] - pair[0], 25);
        }
    }

    #[test]
    fn refractory_spacing_is_enforced() {
        // 4 Hz at 30 fps has peaks ~7.5 samples apart, closer than 9
        let signal = sine(4.0, 30.0, 256, 0.1);
        let peaks = PeakDetector::new(9).detect(&signal);
        assert!(peaks.len() >= 2);
        for pair in peaks.windows(2) {
            assert!(pair[1] - pair[0] >= 9, "gap {:?}", pair);
        }
    }

    #[test]
    fn small_bumps_below_threshold_are_ignored() {
        let mut signal = sine(1.0, 30.0, 120, 0.3);
        // a tiny local maximum in the negative half-cycle
        signal[20] = signal[19].max(signal[21]) + 1e-3;
        let peaks = PeakDetector::new(9).detect(&signal);
        assert!(!peaks.contains(&20));
    }

    #[test]
    fn flat_or_short_signals_have_no_peaks() {
        assert!(PeakDetector::new(9).detect(&[0.0; 100]).is_empty());
        assert!(PeakDetector::new(9).detect(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn endpoints_are_never_peaks() {
        let signal = [5.0, 0.0, 0.0, 3.0, 0.0, 0.0, 5.0];
        assert_eq!(PeakDetector::new(1).detect(&signal), vec![3]);
    }
}
