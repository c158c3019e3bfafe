use serde::{Deserialize, Serialize};

use crate::error::{PpgError, Result};

const BYTES_PER_PIXEL: usize = 4;

/// One frame's channel means, normalised to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub red_mean: f64,
    pub green_mean: f64,
    /// Seconds since an arbitrary session epoch.
    pub timestamp: f64,
}

/// Borrowed view of an interleaved RGBA frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub timestamp: f64,
}

impl<'a> Frame<'a> {
    pub fn new(pixels: &'a [u8], width: usize, height: usize, timestamp: f64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp,
        }
    }
}

/// Part of the frame that is reduced to channel means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    FullFrame,
    /// Centred square whose side is `fraction` of the shorter frame edge.
    CenterSquare { fraction: f64 },
}

/// Pixel bounds of a region inside a frame, half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Bounds {
    pub fn pixel_count(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

impl Region {
    pub fn bounds(&self, width: usize, height: usize) -> Bounds {
        match *self {
            Region::FullFrame => Bounds {
                x0: 0,
                y0: 0,
                x1: width,
                y1: height,
            },
            Region::CenterSquare { fraction } => {
                let side = (width.min(height) as f64 * fraction).floor() as usize;
                let side = side.min(width).min(height);
                let x0 = (width - side) / 2;
                let y0 = (height - side) / 2;
                Bounds {
                    x0,
                    y0,
                    x1: x0 + side,
                    y1: y0 + side,
                }
            }
        }
    }
}

/// Reduces RGBA frames to per-channel means over a fixed region.
#[derive(Debug, Clone)]
pub struct ChannelExtractor {
    region: Region,
}

impl ChannelExtractor {
    pub fn new(region: Region) -> Self {
        Self { region }
    }

    /// Visits every pixel of the region exactly once. Does not allocate.
    pub fn extract(&self, frame: &Frame<'_>) -> Result<RawSample> {
        let expected = frame.width * frame.height * BYTES_PER_PIXEL;
        if frame.pixels.len() != expected {
            return Err(PpgError::FrameSize {
                width: frame.width,
                height: frame.height,
                expected,
                actual: frame.pixels.len(),
            });
        }

        let bounds = self.region.bounds(frame.width, frame.height);
        let pixel_count = bounds.pixel_count();
        if pixel_count == 0 {
            return Err(PpgError::EmptyRegion {
                width: frame.width,
                height: frame.height,
            });
        }

        let row_stride = frame.width * BYTES_PER_PIXEL;
        let mut red_sum: u64 = 0;
        let mut green_sum: u64 = 0;

        for y in bounds.y0..bounds.y1 {
            let start = y * row_stride + bounds.x0 * BYTES_PER_PIXEL;
            let end = y * row_stride + bounds.x1 * BYTES_PER_PIXEL;
            for pixel in frame.pixels[start..end].chunks_exact(BYTES_PER_PIXEL) {
                red_sum += u64::from(pixel[0]);
                green_sum += u64::from(pixel[1]);
            }
        }

        let scale = pixel_count as f64 * 255.0;
        Ok(RawSample {
            red_mean: red_sum as f64 / scale,
            green_mean: green_sum as f64 / scale,
            timestamp: frame.timestamp,
        })
    }
}
