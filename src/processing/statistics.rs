// STATISTICS ------------------------------------------------------------------
//
// Window-level reductions shared by the estimators. All functions tolerate
// empty input and return 0.0 rather than NaN.

pub fn mean(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().sum::<f64>() / signal.len() as f64
}

/// Population standard deviation.
pub fn std_dev(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mean = mean(signal);
    let variance =
        signal.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / signal.len() as f64;
    variance.sqrt()
}

/// AC component: half the peak-to-peak range.
pub fn half_peak_to_peak(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let (min, max) = signal
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    (max - min) / 2.0
}

/// Order statistic at `floor(len * q)` of the sorted signal.
pub fn percentile(signal: &[f64], q: f64) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut sorted = signal.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let index = ((sorted.len() as f64 * q).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(half_peak_to_peak(&[]), 0.0);
        assert_eq!(percentile(&[], 0.75), 0.0);
    }

    #[test]
    fn reductions_match_hand_values() {
        let signal = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&signal), 5.0);
        assert_relative_eq!(std_dev(&signal), 2.0);
        assert_relative_eq!(half_peak_to_peak(&signal), 3.5);
    }

    #[test]
    fn percentile_is_an_order_statistic() {
        let signal = [9.0, 1.0, 8.0, 2.0, 7.0, 3.0, 6.0, 4.0];
        // floor(8 * 0.75) = 6 -> sorted[6] = 8
        assert_eq!(percentile(&signal, 0.75), 8.0);
        assert_eq!(percentile(&signal, 1.0), 9.0);
        assert_eq!(percentile(&signal, 0.0), 1.0);
    }
}
