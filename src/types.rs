// src/types.rs

use opencv::core::{Rect, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frame: FrameConfig,
    pub rois: RoiConfig,
    pub colors: ColorConfig,
    pub segmentation: SegmentationConfig,
    pub detection: DetectionConfig,
    pub calibration: CalibrationConfig,
    pub steering: SteeringConfig,
    pub performance: PerformanceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Only looked at while calibrating the driving direction.
    pub right: Roi,
    /// Drives every steering decision after calibration.
    pub center: Roi,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            right: Roi::new(415, 265, 150, 125),
            center: Roi::new(200, 245, 200, 115),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub yellow: ColorRange,
    pub blue: ColorRange,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            yellow: ColorRange::new([20.0, 80.0, 150.0], [25.0, 190.0, 255.0]),
            blue: ColorRange::new([95.0, 110.0, 50.0], [150.0, 245.0, 255.0]),
        }
    }
}

impl ColorConfig {
    pub fn range(&self, color: ConeColor) -> &ColorRange {
        match color {
            ConeColor::Yellow => &self.yellow,
            ConeColor::Blue => &self.blue,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Gaussian kernel edge length, must be odd.
    pub blur_kernel: i32,
    pub blur_sigma: f64,
    pub morph_iterations: i32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            blur_sigma: 0.0,
            morph_iterations: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A contour must enclose strictly more than this many px² to count as a cone.
    pub min_contour_area: f64,
    /// Run Canny on the mask before tracing contours.
    pub edge_prepass: Option<CannyThresholds>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 60.0,
            edge_prepass: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannyThresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for CannyThresholds {
    fn default() -> Self {
        Self {
            low: 50.0,
            high: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub window: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self { window: 5 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub turn_right: f32,
    pub turn_left: f32,
    pub min: f32,
    pub max: f32,
    pub update_rule: UpdateRule,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            turn_right: 0.025,
            turn_left: -0.025,
            min: -0.3,
            max: 0.3,
            update_rule: UpdateRule::default(),
        }
    }
}

/// How a correction is folded into the current angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateRule {
    /// `angle = angle * factor - delta`
    Damped { factor: f32 },
    /// `angle = angle - delta`
    Incremental,
}

impl Default for UpdateRule {
    fn default() -> Self {
        UpdateRule::Damped { factor: 0.5 }
    }
}

impl UpdateRule {
    pub fn apply(&self, angle: f32, delta: f32) -> f32 {
        match *self {
            UpdateRule::Damped { factor } => angle * factor - delta,
            UpdateRule::Incremental => angle - delta,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub tolerance: ToleranceProfile,
    /// Percentage at or above which a run counts as acceptable.
    pub pass_mark: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            tolerance: ToleranceProfile::default(),
            pass_mark: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToleranceProfile {
    /// `floor` while |estimated| <= `small_angle`, else `ratio * |estimated|`.
    Adaptive {
        small_angle: f64,
        floor: f64,
        ratio: f64,
    },
    Fixed {
        allowed: f64,
    },
}

impl Default for ToleranceProfile {
    fn default() -> Self {
        ToleranceProfile::Adaptive {
            small_angle: 0.01,
            floor: 0.05,
            ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub group_id: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            group_id: "group_09".to_string(),
        }
    }
}

// ============================================================================
// GEOMETRY & COLOR
// ============================================================================

/// Axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn fits_within(&self, width: i32, height: i32) -> bool {
        self.x >= 0
            && self.y >= 0
            && !self.is_empty()
            && self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= height)
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Inclusive HSV bounds in OpenCV's 8-bit convention (H: 0-180, S/V: 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl ColorRange {
    pub const fn new(lower: [f64; 3], upper: [f64; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn lower_scalar(&self) -> Scalar {
        Scalar::new(self.lower[0], self.lower[1], self.lower[2], 0.0)
    }

    pub fn upper_scalar(&self) -> Scalar {
        Scalar::new(self.upper[0], self.upper[1], self.upper[2], 0.0)
    }

    /// First channel whose lower bound exceeds its upper bound.
    pub fn inverted_channel(&self) -> Option<usize> {
        (0..3).find(|&c| self.lower[c] > self.upper[c])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConeColor {
    Yellow,
    Blue,
}

impl ConeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConeColor::Yellow => "yellow",
            ConeColor::Blue => "blue",
        }
    }
}

// ============================================================================
// PER-FRAME RESULTS
// ============================================================================

/// Rotational sense of the vehicle around the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Undetermined,
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Undetermined => "UNDETERMINED",
            Direction::Clockwise => "CLOCKWISE",
            Direction::CounterClockwise => "COUNTER_CLOCKWISE",
        }
    }
}

/// Outcome of one (ROI, color) check on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConeObservation {
    pub color: ConeColor,
    pub found: bool,
    /// Contours traced in the mask, qualifying or not.
    pub contours: usize,
    /// Contours whose area cleared the threshold.
    pub qualifying: usize,
    pub max_area: f64,
}
