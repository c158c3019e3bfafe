use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::processing::Frame;

// -----------------------------------------------------------------------------
// SETUP FOR THE SIMULATED SIGNALS
// -----------------------------------------------------------------------------

const DEFAULT_WIDTH: usize = 16;
const DEFAULT_HEIGHT: usize = 16;
const PULSE_PHASE: f64 = 0.3;

/// Synthetic fingertip-over-lens recording. Channel values are in byte units.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub width: usize,
    pub height: usize,
    pub fps: f64,
    pub heart_rate_bpm: f64,
    pub red_baseline: f64,
    pub green_baseline: f64,
    pub red_amplitude: f64,
    pub green_amplitude: f64,
    /// Linear baseline change per second, both channels.
    pub drift_per_second: f64,
    /// Half-width of uniform per-frame noise.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: 30.0,
            heart_rate_bpm: 60.0,
            red_baseline: 170.0,
            green_baseline: 60.0,
            red_amplitude: 4.0,
            green_amplitude: 2.0,
            drift_per_second: 1.5,
            noise: 0.0,
            seed: 7,
        }
    }
}

// -----------------------------------------------------------------------------
// SIMULATING DATA
// -----------------------------------------------------------------------------

/// Produces RGBA frames whose red and green means follow a pulse riding on a
/// drifting baseline. Pixels carry an ordered dither so the frame mean
/// resolves far below one byte.
pub struct PpgSimulator {
    params: SimulationParams,
    rng: StdRng,
    frame_index: usize,
    pixels: Vec<u8>,
}

impl PpgSimulator {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            rng: StdRng::seed_from_u64(params.seed),
            frame_index: 0,
            pixels: vec![0; params.width * params.height * 4],
            params,
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Channel levels in byte units for frame `index`, before noise.
    pub fn levels(&self, index: usize) -> (f64, f64) {
        let t = index as f64 / self.params.fps;
        let phase = 2.0 * PI * self.params.heart_rate_bpm / 60.0 * t + PULSE_PHASE;
        // more blood, less reflected light
        let pulse = phase.sin();
        let drift = self.params.drift_per_second * t;
        (
            self.params.red_baseline + drift - self.params.red_amplitude * pulse,
            self.params.green_baseline + drift - self.params.green_amplitude * pulse,
        )
    }

    pub fn next_frame(&mut self) -> Frame<'_> {
        let index = self.frame_index;
        let timestamp = index as f64 / self.params.fps;
        let (mut red, mut green) = self.levels(index);
        if self.params.noise > 0.0 {
            red += self.rng.gen_range(-self.params.noise..self.params.noise);
            green += self.rng.gen_range(-self.params.noise..self.params.noise);
        }

        let count = self.params.width * self.params.height;
        for (k, pixel) in self.pixels.chunks_exact_mut(4).enumerate() {
            let dither = (k as f64 + 0.5) / count as f64 - 0.5;
            pixel[0] = to_byte(red + dither);
            pixel[1] = to_byte(green + dither);
            pixel[2] = 0;
            pixel[3] = 255;
        }

        self.frame_index += 1;
        Frame::new(&self.pixels, self.params.width, self.params.height, timestamp)
    }
}

fn to_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
