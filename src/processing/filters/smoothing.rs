use super::WindowFilter;

/// Centred moving average over `2 * half_width + 1` samples, truncated at the
/// window edges.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    half_width: usize,
}

impl MovingAverage {
    pub fn new(half_width: usize) -> Self {
        Self { half_width }
    }
}

impl WindowFilter for MovingAverage {
    fn id(&self) -> &str {
        "moving_average"
    }

    fn apply(&self, window: &[f64]) -> Vec<f64> {
        let n = window.len();
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        for &x in window {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + x);
        }

        (0..n)
            .map(|i| {
                let lo = i.saturating_sub(self.half_width);
                let hi = (i + self.half_width + 1).min(n);
                (prefix[hi] - prefix[lo]) / (hi - lo) as f64
            })
            .collect()
    }
}
