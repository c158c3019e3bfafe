use crate::config::{load_config, Config};
use crate::error::PpgError;
use crate::processing::{Frame, Measurement, Pipeline, PipelineState, RawSample};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err(err: PpgError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

#[pyclass]
#[derive(Clone)]
pub struct PyMeasurement {
    #[pyo3(get)]
    pub heart_rate_bpm: Option<u32>,
    #[pyo3(get)]
    pub spo2_percent: Option<u32>,
    #[pyo3(get)]
    pub signal_quality: u8,
    #[pyo3(get)]
    pub is_signal: bool,
    #[pyo3(get)]
    pub produced_at: f64,
}

impl From<&Measurement> for PyMeasurement {
    fn from(m: &Measurement) -> Self {
        Self {
            heart_rate_bpm: m.heart_rate_bpm,
            spo2_percent: m.spo2_percent,
            signal_quality: m.signal_quality,
            is_signal: m.is_signal,
            produced_at: m.produced_at,
        }
    }
}

#[pyclass]
pub struct PyPipeline {
    pipeline: Pipeline,
}

#[pymethods]
impl PyPipeline {
    #[new]
    #[pyo3(signature = (config_path=None))]
    pub fn new(config_path: Option<String>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => load_config(path).map_err(to_py_err)?,
            None => Config::default(),
        };
        let pipeline = Pipeline::new(config).map_err(to_py_err)?;
        Ok(PyPipeline { pipeline })
    }

    pub fn start(&mut self) {
        self.pipeline.start();
    }

    pub fn stop(&mut self) {
        self.pipeline.stop();
    }

    pub fn process_frame(
        &mut self,
        pixels: Vec<u8>,
        width: usize,
        height: usize,
        timestamp: f64,
    ) -> PyResult<Option<PyMeasurement>> {
        let frame = Frame::new(&pixels, width, height, timestamp);
        let measurement = self.pipeline.process_frame(&frame).map_err(to_py_err)?;
        Ok(measurement.as_ref().map(PyMeasurement::from))
    }

    pub fn process_sample(
        &mut self,
        red_mean: f64,
        green_mean: f64,
        timestamp: f64,
    ) -> Option<PyMeasurement> {
        self.pipeline
            .process_sample(RawSample {
                red_mean,
                green_mean,
                timestamp,
            })
            .as_ref()
            .map(PyMeasurement::from)
    }

    pub fn measurement(&self) -> Option<PyMeasurement> {
        self.pipeline.measurement().map(PyMeasurement::from)
    }

    pub fn is_signal(&self) -> bool {
        self.pipeline.is_signal()
    }

    pub fn state(&self) -> &'static str {
        match self.pipeline.state() {
            PipelineState::Idle => "idle",
            PipelineState::Collecting => "collecting",
            PipelineState::Measuring => "measuring",
        }
    }

    pub fn collection_progress(&self) -> u8 {
        self.pipeline.collection_progress()
    }

    /// Recent `(time, value, is_signal)` points, oldest first.
    pub fn plot_points(&self) -> Vec<(f64, f64, bool)> {
        self.pipeline
            .plot_points()
            .map(|p| (p.time, p.value, p.is_signal))
            .collect()
    }
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn ppg_vitals(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPipeline>()?;
    m.add_class::<PyMeasurement>()?;
    Ok(())
}
