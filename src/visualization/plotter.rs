// src/visualization/plotter.rs

use super::PlotConfig;
use std::collections::VecDeque;

/// One processed-signal point for a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub time: f64,
    pub value: f64,
    pub is_signal: bool,
}

/// Bounded most-recent-N history of processed values. Rendering is left to
/// the host.
pub struct SignalPlotter {
    config: PlotConfig,
    points: VecDeque<PlotPoint>,
}

impl SignalPlotter {
    pub fn new(config: PlotConfig) -> Self {
        Self {
            points: VecDeque::with_capacity(config.max_points),
            config,
        }
    }

    pub fn add_point(&mut self, point: PlotPoint) {
        self.points.push_back(point);
        if self.points.len() > self.config.max_points {
            self.points.pop_front();
        }
    }

    /// Oldest-first view, produced lazily.
    pub fn points(&self) -> impl Iterator<Item = &PlotPoint> + '_ {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
