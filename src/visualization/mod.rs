// src/visualization/mod.rs

pub mod plotter;

use serde::{Deserialize, Serialize};

pub use plotter::{PlotPoint, SignalPlotter};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    /// Most recent points kept for the presentation layer.
    pub max_points: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self { max_points: 100 }
    }
}
