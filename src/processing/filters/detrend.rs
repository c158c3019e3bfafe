use super::WindowFilter;
use crate::processing::statistics::mean;

/// Ordinary least-squares linear detrend over sample indices `0..n`.
///
/// Removes slow baseline drift (ambient light, finger pressure) while keeping
/// the pulsatile component. The output is zero-mean up to rounding error.
#[derive(Debug, Clone, Default)]
pub struct LinearDetrend;

impl LinearDetrend {
    pub fn new() -> Self {
        Self
    }

    /// Closed-form `(slope, intercept)` of the fit, `None` below two samples.
    pub fn fit(window: &[f64]) -> Option<(f64, f64)> {
        let n = window.len();
        if n < 2 {
            return None;
        }

        let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
        for (i, &y) in window.iter().enumerate() {
            let x = i as f64;
            sx += x;
            sy += y;
            sxy += x * y;
            sxx += x * x;
        }

        let n = n as f64;
        let slope = (n * sxy - sx * sy) / (n * sxx - sx * sx);
        let intercept = sy / n - slope * (sx / n);
        Some((slope, intercept))
    }
}

impl WindowFilter for LinearDetrend {
    fn id(&self) -> &str {
        "linear_detrend"
    }

    fn apply(&self, window: &[f64]) -> Vec<f64> {
        match Self::fit(window) {
            Some((slope, intercept)) => window
                .iter()
                .enumerate()
                .map(|(i, &y)| y - (intercept + slope * i as f64))
                .collect(),
            // a single sample has no trend, only an offset
            None => {
                let offset = mean(window);
                window.iter().map(|&y| y - offset).collect()
            }
        }
    }
}
