use super::{Estimate, Rejection};
use crate::config::Spo2Config;
use crate::processing::statistics::{half_peak_to_peak, mean};

/// Smoothing memory: the last accepted SpO2. Lives for the whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationState {
    pub previous: Option<u32>,
}

/// Input windows for one SpO2 estimate.
#[derive(Debug, Clone, Copy)]
pub struct Spo2Inputs<'a> {
    pub red_processed: &'a [f64],
    pub green_processed: &'a [f64],
    pub red_raw: &'a [f64],
    pub green_raw: &'a [f64],
}

/// Ratio-of-ratios SpO2 proxy.
///
/// Commodity cameras have no infrared channel, so green stands in for the IR
/// reference. Absolute values are not clinically meaningful; the linear
/// calibration `intercept - slope * R` is the empirical one used for
/// red/IR oximeters and is kept as-is.
#[derive(Debug, Clone)]
pub struct Spo2Estimator {
    config: Spo2Config,
    calibration: CalibrationState,
}

impl Spo2Estimator {
    pub fn new(config: Spo2Config) -> Self {
        Self {
            config,
            calibration: CalibrationState::default(),
        }
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }

    pub fn reset(&mut self) {
        self.calibration = CalibrationState::default();
    }

    pub fn estimate(&mut self, inputs: &Spo2Inputs<'_>) -> Estimate<u32> {
        let min = self.config.min_samples;
        if inputs.red_processed.len() < min
            || inputs.green_processed.len() < min
            || inputs.red_raw.len() < min
            || inputs.green_raw.len() < min
        {
            return self.hold(Rejection::InsufficientSamples);
        }

        let r = match ratio_of_ratios(inputs) {
            Some(r) => r,
            None => return self.hold(Rejection::ZeroComponent),
        };

        let raw_spo2 = self.calibrate(r);
        let smoothed = match self.calibration.previous {
            Some(previous) => {
                let alpha = self.config.smoothing_alpha;
                (1.0 - alpha) * previous as f64 + alpha * raw_spo2
            }
            None => raw_spo2,
        };

        let spo2 = smoothed.round() as u32;
        self.calibration.previous = Some(spo2);
        Estimate::Accepted(spo2)
    }

    /// Linear calibration clamped to the configured percent range.
    pub fn calibrate(&self, r: f64) -> f64 {
        (self.config.intercept - self.config.slope * r)
            .clamp(self.config.min_percent, self.config.max_percent)
    }

    fn hold(&self, reason: Rejection) -> Estimate<u32> {
        Estimate::Held {
            value: self.calibration.previous,
            reason,
        }
    }
}

/// `(AC_red / DC_red) / (AC_green / DC_green)`, `None` if any component is
/// zero or the ratio is not finite.
pub fn ratio_of_ratios(inputs: &Spo2Inputs<'_>) -> Option<f64> {
    let red_ac = half_peak_to_peak(inputs.red_processed);
    let green_ac = half_peak_to_peak(inputs.green_processed);
    let red_dc = mean(inputs.red_raw);
    let green_dc = mean(inputs.green_raw);

    if red_ac == 0.0 || green_ac == 0.0 || red_dc == 0.0 || green_dc == 0.0 {
        return None;
    }

    let r = (red_ac / red_dc) / (green_ac / green_dc);
    r.is_finite().then_some(r)
}
