pub mod config;
pub mod error;
pub mod local;
pub mod processing;
pub mod utils;
pub mod visualization;

#[cfg(feature = "python")]
pub mod bindings;

pub use config::{load_config, save_config, Config};
pub use error::{PpgError, Result};
pub use processing::{
    create_shared_pipeline, Frame, Measurement, Pipeline, PipelineState, RawSample, Region,
    SharedPipeline,
};
