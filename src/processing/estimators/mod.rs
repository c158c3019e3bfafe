pub mod heart_rate;
pub mod quality;
pub mod spo2;

pub use heart_rate::HeartRateEstimator;
pub use quality::SignalQualityScorer;
pub use spo2::{CalibrationState, Spo2Estimator};

/// Why an estimator kept its previous value instead of a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Input shorter than the estimator's minimum.
    InsufficientSamples,
    /// Fewer than two peaks, no usable periodicity.
    TooFewPeaks,
    /// Result outside the accepted physiological range.
    OutOfRange,
    /// A zero AC or DC component would divide by zero.
    ZeroComponent,
}

/// Result of one estimator run. A held value is whatever was last accepted
/// and may be `None` before the first acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimate<T> {
    Accepted(T),
    Held { value: Option<T>, reason: Rejection },
}

impl<T: Copy> Estimate<T> {
    pub fn value(&self) -> Option<T> {
        match *self {
            Estimate::Accepted(value) => Some(value),
            Estimate::Held { value, .. } => value,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Estimate::Accepted(_))
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match *self {
            Estimate::Accepted(_) => None,
            Estimate::Held { reason, .. } => Some(reason),
        }
    }
}
