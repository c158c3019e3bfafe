/// Effective sampling rate from frame timestamps: frames counted over the
/// elapsed time between the first and latest frame.
#[derive(Debug, Clone)]
pub struct FrameRateEstimator {
    nominal_fps: f64,
    estimate: bool,
    first_timestamp: Option<f64>,
    last_timestamp: f64,
    frames: usize,
}

impl FrameRateEstimator {
    pub fn new(nominal_fps: f64, estimate: bool) -> Self {
        Self {
            nominal_fps,
            estimate,
            first_timestamp: None,
            last_timestamp: 0.0,
            frames: 0,
        }
    }

    pub fn observe(&mut self, timestamp: f64) {
        if self.first_timestamp.is_none() {
            self.first_timestamp = Some(timestamp);
        }
        self.last_timestamp = timestamp;
        self.frames += 1;
    }

    /// Falls back to the nominal rate until two frames with increasing
    /// timestamps have been seen.
    pub fn fps(&self) -> f64 {
        if !self.estimate || self.frames < 2 {
            return self.nominal_fps;
        }
        let first = match self.first_timestamp {
            Some(first) => first,
            None => return self.nominal_fps,
        };
        let elapsed = self.last_timestamp - first;
        let fps = (self.frames - 1) as f64 / elapsed;
        if elapsed > 0.0 && fps.is_finite() {
            fps
        } else {
            self.nominal_fps
        }
    }

    pub fn reset(&mut self) {
        self.first_timestamp = None;
        self.last_timestamp = 0.0;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn measures_regular_frames() {
        let mut rate = FrameRateEstimator::new(30.0, true);
        for i in 0..121 {
            rate.observe(10.0 + i as f64 / 60.0);
        }
        assert_relative_eq!(rate.fps(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn falls_back_to_nominal() {
        let mut rate = FrameRateEstimator::new(30.0, true);
        assert_eq!(rate.fps(), 30.0);
        rate.observe(1.0);
        assert_eq!(rate.fps(), 30.0);
        // frozen clock
        rate.observe(1.0);
        assert_eq!(rate.fps(), 30.0);
    }

    #[test]
    fn fixed_rate_ignores_timestamps() {
        let mut rate = FrameRateEstimator::new(25.0, false);
        rate.observe(0.0);
        rate.observe(1.0);
        assert_eq!(rate.fps(), 25.0);
    }

    #[test]
    fn reset_starts_over() {
        let mut rate = FrameRateEstimator::new(30.0, true);
        rate.observe(0.0);
        rate.observe(0.01);
        rate.reset();
        assert_eq!(rate.fps(), 30.0);
    }
}
