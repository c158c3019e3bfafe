pub mod detrend;
pub mod smoothing;

pub use detrend::LinearDetrend;
pub use smoothing::MovingAverage;

// FILTER COMPONENT ------------------------------------------------------------

/// A whole-window transform applied when a window completes.
pub trait WindowFilter: Send {
    fn id(&self) -> &str;

    /// Returns a new sequence of the same length as `window`.
    fn apply(&self, window: &[f64]) -> Vec<f64>;
}

/// Runs `window` through every filter in order.
pub fn apply_chain(filters: &[Box<dyn WindowFilter>], window: &[f64]) -> Vec<f64> {
    filters
        .iter()
        .fold(window.to_vec(), |signal, filter| filter.apply(&signal))
}

/// `"linear_detrend+moving_average"` style label for logs.
pub fn describe_chain(filters: &[Box<dyn WindowFilter>]) -> String {
    filters
        .iter()
        .map(|filter| filter.id())
        .collect::<Vec<_>>()
        .join("+")
}
