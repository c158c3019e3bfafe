pub mod buffers;
pub mod detectors;
pub mod estimators;
pub mod extractor;
pub mod filters;
pub mod frame_rate;
pub mod pipeline;
pub mod statistics;

pub use extractor::{ChannelExtractor, Frame, RawSample, Region};
pub use pipeline::{create_shared_pipeline, Measurement, Pipeline, PipelineState, SharedPipeline};
