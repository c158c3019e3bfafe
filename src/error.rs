use thiserror::Error;

#[derive(Debug, Error)]
pub enum PpgError {
    #[error("failed to read config file: {0}")]
    ConfigRead(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[source] serde_yaml::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[source] serde_yaml::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("pixel buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA frame")]
    FrameSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("region of interest covers no pixels in a {width}x{height} frame")]
    EmptyRegion { width: usize, height: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PpgError>;
