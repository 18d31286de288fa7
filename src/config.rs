// src/config.rs

use crate::error::ConfigError;
use crate::types::{Config, ToleranceProfile};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Checks every startup invariant. Must pass before any frame is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.frame.width, self.frame.height);
        if width <= 0 || height <= 0 {
            return Err(ConfigError::InvalidFrameSize { width, height });
        }

        for (name, roi) in [("right", self.rois.right), ("center", self.rois.center)] {
            if !roi.fits_within(width, height) {
                return Err(ConfigError::RoiOutOfBounds {
                    name,
                    roi,
                    width,
                    height,
                });
            }
        }

        for (name, range) in [("yellow", &self.colors.yellow), ("blue", &self.colors.blue)] {
            if let Some(channel) = range.inverted_channel() {
                return Err(ConfigError::InvertedColorRange { name, channel });
            }
        }

        let blur = self.segmentation.blur_kernel;
        if blur <= 0 || blur % 2 == 0 {
            return Err(ConfigError::InvalidBlurKernel(blur));
        }
        if self.segmentation.morph_iterations <= 0 {
            return Err(ConfigError::InvalidMorphIterations(
                self.segmentation.morph_iterations,
            ));
        }
        if self.detection.min_contour_area < 0.0 {
            return Err(ConfigError::InvalidContourArea(
                self.detection.min_contour_area,
            ));
        }

        let (min, max) = (self.steering.min, self.steering.max);
        if !(min < max) {
            return Err(ConfigError::InvalidSteeringBounds { min, max });
        }

        let tolerance_ok = match self.performance.tolerance {
            ToleranceProfile::Adaptive {
                small_angle,
                floor,
                ratio,
            } => small_angle >= 0.0 && floor >= 0.0 && ratio >= 0.0,
            ToleranceProfile::Fixed { allowed } => allowed >= 0.0,
        };
        if !tolerance_ok {
            return Err(ConfigError::InvalidTolerance);
        }

        Ok(())
    }
}
