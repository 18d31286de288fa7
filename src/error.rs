// src/error.rs

use crate::types::Roi;
use thiserror::Error;

/// Startup-time configuration problems. All of them are fatal before the
/// first frame is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("frame dimensions must be positive, got {width}x{height}")]
    InvalidFrameSize { width: i32, height: i32 },

    #[error("{name} ROI {roi} lies outside the {width}x{height} frame")]
    RoiOutOfBounds {
        name: &'static str,
        roi: Roi,
        width: i32,
        height: i32,
    },

    #[error("{name} color range has lower bound above upper bound on channel {channel}")]
    InvertedColorRange { name: &'static str, channel: usize },

    #[error("steering bounds must satisfy min < max, got [{min}, {max}]")]
    InvalidSteeringBounds { min: f32, max: f32 },

    #[error("gaussian kernel must be odd and positive, got {0}")]
    InvalidBlurKernel(i32),

    #[error("morphology iterations must be positive, got {0}")]
    InvalidMorphIterations(i32),

    #[error("minimum contour area must be non-negative, got {0}")]
    InvalidContourArea(f64),

    #[error("tolerance parameters must be non-negative")]
    InvalidTolerance,

    #[error("frame is {got_width}x{got_height} but {width}x{height} was configured")]
    FrameSizeMismatch {
        width: i32,
        height: i32,
        got_width: i32,
        got_height: i32,
    },

    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
