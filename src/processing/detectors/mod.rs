pub mod peak;

pub use peak::PeakDetector;
