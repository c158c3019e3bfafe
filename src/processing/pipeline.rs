use super::buffers::{SampleBuffers, WindowEvent};
use super::estimators::{
    Estimate, HeartRateEstimator, SignalQualityScorer, Spo2Estimator,
};
use super::estimators::spo2::Spo2Inputs;
use super::extractor::{ChannelExtractor, Frame, RawSample};
use super::filters::{describe_chain, LinearDetrend, MovingAverage, WindowFilter};
use super::frame_rate::FrameRateEstimator;
use crate::config::Config;
use crate::error::Result;
use crate::visualization::{PlotPoint, SignalPlotter};

use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

// -----------------------------------------------------------------------------
// RUST CORE LOGIC
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No session running; frames are ignored.
    Idle,
    /// Session running, buffers below minimum population.
    Collecting,
    /// Buffers populated; every active window yields a measurement.
    Measuring,
}

/// Snapshot produced at the end of an active window. A new window replaces
/// it rather than modifying it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Last accepted heart rate; `None` until one has been accepted.
    pub heart_rate_bpm: Option<u32>,
    /// Last accepted SpO2; `None` until one has been accepted.
    pub spo2_percent: Option<u32>,
    pub signal_quality: u8,
    pub is_signal: bool,
    /// Timestamp of the frame that completed the window.
    pub produced_at: f64,
}

/// Reusable copies of the ring buffers handed to the estimators.
#[derive(Default)]
struct Scratch {
    red_processed: Vec<f64>,
    green_processed: Vec<f64>,
    red_raw: Vec<f64>,
    green_raw: Vec<f64>,
}

// PIPELINE COMPONENT ----------------------------------------------------------

/// One measurement session. Owns every buffer and every held value; invoke
/// once per frame, never concurrently.
pub struct Pipeline {
    config: Config,
    state: PipelineState,
    extractor: ChannelExtractor,
    filter_chain: String,
    buffers: SampleBuffers,
    frame_rate: FrameRateEstimator,
    heart_rate: HeartRateEstimator,
    spo2: Spo2Estimator,
    quality: SignalQualityScorer,
    plotter: SignalPlotter,
    measurement: Option<Measurement>,
    frames_seen: usize,
    scratch: Scratch,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut filters: Vec<Box<dyn WindowFilter>> = vec![Box::new(LinearDetrend::new())];
        if let Some(half_width) = config.pipeline.smoothing_half_width {
            filters.push(Box::new(MovingAverage::new(half_width)));
        }
        let filter_chain = describe_chain(&filters);

        Ok(Self {
            state: PipelineState::Idle,
            extractor: ChannelExtractor::new(config.extractor.region),
            filter_chain,
            buffers: SampleBuffers::new(
                config.pipeline.window_length,
                config.pipeline.buffer_capacity,
                filters,
            ),
            frame_rate: FrameRateEstimator::new(
                config.pipeline.nominal_fps,
                config.pipeline.estimate_fps,
            ),
            heart_rate: HeartRateEstimator::new(config.heart_rate.clone()),
            spo2: Spo2Estimator::new(config.spo2.clone()),
            quality: SignalQualityScorer::new(config.quality.clone()),
            plotter: SignalPlotter::new(config.plot.clone()),
            measurement: None,
            frames_seen: 0,
            scratch: Scratch::default(),
            config,
        })
    }

    /// Begins a session. No effect if one is already running.
    pub fn start(&mut self) {
        if self.state == PipelineState::Idle {
            info!("session started");
            self.state = PipelineState::Collecting;
        }
    }

    /// Ends the session, discarding every buffer and held value.
    pub fn stop(&mut self) {
        self.buffers.clear();
        self.frame_rate.reset();
        self.heart_rate.reset();
        self.spo2.reset();
        self.plotter.clear();
        self.measurement = None;
        self.frames_seen = 0;
        if self.state != PipelineState::Idle {
            info!("session stopped");
        }
        self.state = PipelineState::Idle;
    }

    /// Extracts channel means from `frame` and processes them. A malformed
    /// frame is rejected before any state changes.
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> Result<Option<Measurement>> {
        if self.state == PipelineState::Idle {
            return Ok(None);
        }
        let sample = self.extractor.extract(frame)?;
        Ok(self.process_sample(sample))
    }

    /// Feeds one frame's channel means. Returns a measurement when this
    /// sample completes an active window after the buffers are populated.
    pub fn process_sample(&mut self, sample: RawSample) -> Option<Measurement> {
        if self.state == PipelineState::Idle {
            trace!("sample ignored while idle");
            return None;
        }

        self.frames_seen += 1;
        if self.frames_seen <= self.config.pipeline.warmup_frames {
            return None;
        }

        self.frame_rate.observe(sample.timestamp);
        let event = self.buffers.push(&sample);
        self.plotter.add_point(PlotPoint {
            time: sample.timestamp,
            value: self.buffers.display_value(),
            is_signal: self.buffers.is_signal(),
        });
        self.update_state();

        trace!(
            frame = self.buffers.frame_count(),
            red = sample.red_mean,
            green = sample.green_mean,
            "sample"
        );

        match event {
            Some(WindowEvent::Active { window_index }) => {
                debug!(
                    window_index,
                    filters = %self.filter_chain,
                    raw = self.buffers.raw_red().len(),
                    processed = self.buffers.processed_red().len(),
                    "active window complete"
                );
                if self.state == PipelineState::Measuring {
                    Some(self.measure(sample.timestamp))
                } else {
                    None
                }
            }
            Some(WindowEvent::Idle { window_index }) => {
                debug!(window_index, "idle window complete");
                None
            }
            None => None,
        }
    }

    fn update_state(&mut self) {
        if self.state != PipelineState::Collecting {
            return;
        }
        let min = self.config.pipeline.min_population;
        if self.buffers.raw_red().len() >= min && self.buffers.processed_red().len() >= min {
            info!(frame = self.buffers.frame_count(), "buffers populated, measuring");
            self.state = PipelineState::Measuring;
        }
    }

    fn measure(&mut self, timestamp: f64) -> Measurement {
        let scratch = &mut self.scratch;
        self.buffers.processed_red().copy_into(&mut scratch.red_processed);
        self.buffers.processed_green().copy_into(&mut scratch.green_processed);
        self.buffers.raw_red().copy_into(&mut scratch.red_raw);
        self.buffers.raw_green().copy_into(&mut scratch.green_raw);

        let fps = self.frame_rate.fps();
        let heart_rate = self.heart_rate.estimate(&scratch.red_processed, fps);
        let spo2 = self.spo2.estimate(&Spo2Inputs {
            red_processed: &scratch.red_processed,
            green_processed: &scratch.green_processed,
            red_raw: &scratch.red_raw,
            green_raw: &scratch.green_raw,
        });
        let signal_quality = self.quality.score(&scratch.red_processed);

        report_rejection("heart_rate", &heart_rate);
        report_rejection("spo2", &spo2);

        let measurement = Measurement {
            heart_rate_bpm: heart_rate.value(),
            spo2_percent: spo2.value(),
            signal_quality,
            is_signal: self.buffers.is_signal(),
            produced_at: timestamp,
        };
        debug!(?measurement, fps, "measurement");
        self.measurement = Some(measurement);
        measurement
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Latest measurement; unchanged while no new one is produced.
    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    /// Active/idle window gate for the current window.
    pub fn is_signal(&self) -> bool {
        self.buffers.is_signal()
    }

    /// Recent processed values for plotting, oldest first.
    pub fn plot_points(&self) -> impl Iterator<Item = &PlotPoint> + '_ {
        self.plotter.points()
    }

    pub fn fps(&self) -> f64 {
        self.frame_rate.fps()
    }

    pub fn frame_count(&self) -> usize {
        self.buffers.frame_count()
    }

    /// Percent of the way to the first measurement while collecting.
    pub fn collection_progress(&self) -> u8 {
        match self.state {
            PipelineState::Idle => 0,
            PipelineState::Measuring => 100,
            PipelineState::Collecting => {
                let needed = frames_until_populated(
                    self.config.pipeline.window_length,
                    self.config.pipeline.buffer_capacity,
                    self.config.pipeline.min_population,
                );
                let done = self.buffers.frame_count().min(needed);
                (done * 100 / needed.max(1)) as u8
            }
        }
    }
}

/// Frames until both raw and processed buffers reach `min_population`.
/// Processed samples only arrive with active windows (every other window).
fn frames_until_populated(window_length: usize, capacity: usize, min_population: usize) -> usize {
    let per_window = window_length.min(capacity).max(1);
    let active_windows = (min_population + per_window - 1) / per_window;
    let processed_ready = (2 * active_windows.max(1) - 1) * window_length;
    processed_ready.max(min_population)
}

fn report_rejection(metric: &str, estimate: &Estimate<u32>) {
    if let Some(reason) = estimate.rejection() {
        warn!(metric, ?reason, held = ?estimate.value(), "estimate rejected, holding previous value");
    }
}

// SHARED ACCESS ---------------------------------------------------------------

/// For hosts that deliver frames from more than one thread. The lock must be
/// held for a whole `process_frame` call.
pub type SharedPipeline = Arc<Mutex<Pipeline>>;

pub fn create_shared_pipeline(config: Config) -> Result<SharedPipeline> {
    Ok(Arc::new(Mutex::new(Pipeline::new(config)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn pulse_sample(i: usize, fps: f64) -> RawSample {
        let t = i as f64 / fps;
        let pulse = (2.0 * PI * t + 0.3).sin();
        RawSample {
            red_mean: 0.6 + 0.0001 * i as f64 - 0.02 * pulse,
            green_mean: 0.3 + 0.00005 * i as f64 - 0.01 * pulse,
            timestamp: t,
        }
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.pipeline.window_length = 120;
        config.pipeline.buffer_capacity = 100;
        config.pipeline.min_population = 90;
        config
    }

    #[test]
    fn idle_pipeline_ignores_samples() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        for i in 0..400 {
            assert!(pipeline.process_sample(pulse_sample(i, 30.0)).is_none());
        }
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(pipeline.frame_count(), 0);
    }

    #[test]
    fn first_window_moves_to_measuring() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        pipeline.start();
        let mut produced = Vec::new();
        for i in 0..120 {
            if let Some(m) = pipeline.process_sample(pulse_sample(i, 30.0)) {
                produced.push((i, m));
            }
            if i < 119 {
                assert_eq!(pipeline.state(), PipelineState::Collecting);
            }
        }
        assert_eq!(pipeline.state(), PipelineState::Measuring);
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].0, 119);
        assert!(produced[0].1.is_signal);
    }

    #[test]
    fn idle_windows_produce_nothing_and_keep_last_measurement() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        pipeline.start();
        for i in 0..120 {
            pipeline.process_sample(pulse_sample(i, 30.0));
        }
        let first = *pipeline.measurement().unwrap();
        for i in 120..240 {
            assert!(pipeline.process_sample(pulse_sample(i, 30.0)).is_none());
        }
        assert!(!pipeline.is_signal());
        assert_eq!(pipeline.measurement(), Some(&first));
        assert_eq!(pipeline.state(), PipelineState::Measuring);
    }

    #[test]
    fn stop_resets_to_idle() {
        let mut pipeline = Pipeline::new(small_config()).unwrap();
        pipeline.start();
        for i in 0..130 {
            pipeline.process_sample(pulse_sample(i, 30.0));
        }
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(pipeline.measurement().is_none());
        assert_eq!(pipeline.plot_points().count(), 0);
        assert_eq!(pipeline.frame_count(), 0);

        pipeline.start();
        assert_eq!(pipeline.state(), PipelineState::Collecting);
    }

    #[test]
    fn warmup_frames_are_discarded() {
        let mut config = small_config();
        config.pipeline.warmup_frames = 10;
        let mut pipeline = Pipeline::new(config).unwrap();
        pipeline.start();
        for i in 0..10 {
            pipeline.process_sample(pulse_sample(i, 30.0));
        }
        assert_eq!(pipeline.frame_count(), 0);
        pipeline.process_sample(pulse_sample(10, 30.0));
        assert_eq!(pipeline.frame_count(), 1);
    }

    #[test]
    fn progress_tracks_frames_to_first_measurement() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        assert_eq!(pipeline.collection_progress(), 0);
        pipeline.start();
        for i in 0..150 {
            pipeline.process_sample(pulse_sample(i, 30.0));
        }
        assert_eq!(pipeline.collection_progress(), 50);
        for i in 150..300 {
            pipeline.process_sample(pulse_sample(i, 30.0));
        }
        assert_eq!(pipeline.collection_progress(), 100);
    }

    #[test]
    fn frames_until_populated_accounts_for_idle_windows() {
        assert_eq!(frames_until_populated(300, 256, 90), 300);
        // 50-frame windows need two active windows (0 and 2) for 90 samples
        assert_eq!(frames_until_populated(50, 256, 90), 150);
        assert_eq!(frames_until_populated(20, 256, 10), 20);
    }

    #[test]
    fn plot_points_are_bounded() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        pipeline.start();
        for i in 0..250 {
            pipeline.process_sample(pulse_sample(i, 30.0));
        }
        assert_eq!(pipeline.plot_points().count(), 100);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = Config::default();
        config.pipeline.buffer_capacity = 0;
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn shared_pipeline_serialises_access() {
        let shared = create_shared_pipeline(Config::default()).unwrap();
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    let mut pipeline = shared.lock().unwrap();
                    pipeline.start();
                    for i in 0..50 {
                        pipeline.process_sample(pulse_sample(i, 30.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.lock().unwrap().frame_count(), 100);
    }
}
