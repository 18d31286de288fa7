// src/pipeline.rs
//
// Per-frame orchestration. Exactly one frame goes through end to end before
// the next one is fetched:
//
//   calibrating:  right ROI -> yellow mask -> cone? -> DirectionCalibrator
//   determined:   center ROI -> blue mask -> cone?
//                             -> (only if no blue) yellow mask -> cone?
//                             -> SteeringEstimator
//   every frame:  PerformanceEvaluator against the latest ground truth

use crate::calibration::DirectionCalibrator;
use crate::cone_detection::ConeDetector;
use crate::error::ConfigError;
use crate::frame::Frame;
use crate::performance::{Evaluation, PerformanceEvaluator, RunSummary};
use crate::segmentation::{Mask, Segmenter};
use crate::steering::{CenterSighting, SteeringEstimator, SteeringOutcome};
use crate::types::{ColorConfig, ConeColor, ConeObservation, Config, Direction, Roi, RoiConfig};
use anyhow::Result;
use tracing::debug;

/// Everything the core decided about one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    pub timestamp_us: u64,
    pub direction: Direction,
    /// Right-ROI yellow check, only on calibration frames.
    pub calibration: Option<ConeObservation>,
    pub blue: Option<ConeObservation>,
    /// Center-ROI yellow check, only when blue was not found.
    pub yellow: Option<ConeObservation>,
    pub steering: Option<SteeringOutcome>,
    pub angle: f32,
    pub actual: f32,
    pub evaluation: Evaluation,
    /// Masks behind each check, kept only when diagnostics are enabled.
    pub masks: Vec<(&'static str, Mask)>,
}

pub struct SteeringPipeline {
    frame_width: i32,
    frame_height: i32,
    rois: RoiConfig,
    colors: ColorConfig,
    segmenter: Segmenter,
    detector: ConeDetector,
    calibrator: DirectionCalibrator,
    estimator: SteeringEstimator,
    evaluator: PerformanceEvaluator,
    frame_index: u64,
    keep_masks: bool,
}

impl SteeringPipeline {
    /// `config` must already have passed `Config::validate`.
    pub fn new(config: &Config) -> Self {
        Self {
            frame_width: config.frame.width,
            frame_height: config.frame.height,
            rois: config.rois,
            colors: config.colors,
            segmenter: Segmenter::new(&config.segmentation),
            detector: ConeDetector::new(&config.detection),
            calibrator: DirectionCalibrator::new(config.calibration.window),
            estimator: SteeringEstimator::new(config.steering),
            evaluator: PerformanceEvaluator::new(&config.performance),
            frame_index: 0,
            keep_masks: false,
        }
    }

    pub fn with_diagnostics(mut self, keep_masks: bool) -> Self {
        self.keep_masks = keep_masks;
        self
    }

    pub fn direction(&self) -> Direction {
        self.calibrator.direction()
    }

    #[cfg(test)]
    pub fn angle(&self) -> f32 {
        self.estimator.angle()
    }

    #[cfg(test)]
    pub fn evaluator(&self) -> &PerformanceEvaluator {
        &self.evaluator
    }

    pub fn summary(&self) -> RunSummary {
        self.evaluator.summary(self.calibrator.direction())
    }

    pub fn process(&mut self, frame: &Frame, actual: f32) -> Result<FrameReport> {
        if frame.width() != self.frame_width || frame.height() != self.frame_height {
            return Err(ConfigError::FrameSizeMismatch {
                width: self.frame_width,
                height: self.frame_height,
                got_width: frame.width(),
                got_height: frame.height(),
            }
            .into());
        }

        let mut masks = Vec::new();
        let mut calibration = None;
        let mut blue = None;
        let mut yellow = None;
        let mut steering = None;

        if self.calibrator.is_calibrating() {
            let obs = self.check(
                frame,
                self.rois.right,
                ConeColor::Yellow,
                "Right Contour Image",
                &mut masks,
            )?;
            self.calibrator.observe(obs.found);
            calibration = Some(obs);
        } else {
            let direction = self.calibrator.direction();
            let blue_obs = self.check(
                frame,
                self.rois.center,
                ConeColor::Blue,
                "Blue Center Image",
                &mut masks,
            )?;
            blue = Some(blue_obs);

            let sighting = if blue_obs.found {
                CenterSighting::Cone(ConeColor::Blue)
            } else {
                let yellow_obs = self.check(
                    frame,
                    self.rois.center,
                    ConeColor::Yellow,
                    "Yellow Center Image",
                    &mut masks,
                )?;
                yellow = Some(yellow_obs);
                if yellow_obs.found {
                    CenterSighting::Cone(ConeColor::Yellow)
                } else {
                    CenterSighting::Nothing
                }
            };

            steering = Some(self.estimator.update(direction, sighting));
        }

        let angle = self.estimator.angle();
        let evaluation = self.evaluator.evaluate(angle, actual);

        debug!(
            "frame {} @ {}µs: dir={} steer={:?} angle={:.4} actual={:.4} ok={} perf={:.1}%",
            self.frame_index,
            frame.timestamp_us(),
            self.calibrator.direction().as_str(),
            steering,
            angle,
            actual,
            evaluation.within_tolerance,
            evaluation.percentage
        );

        let report = FrameReport {
            frame_index: self.frame_index,
            timestamp_us: frame.timestamp_us(),
            direction: self.calibrator.direction(),
            calibration,
            blue,
            yellow,
            steering,
            angle,
            actual,
            evaluation,
            masks,
        };
        self.frame_index += 1;
        Ok(report)
    }

    fn check(
        &self,
        frame: &Frame,
        roi: Roi,
        color: ConeColor,
        label: &'static str,
        masks: &mut Vec<(&'static str, Mask)>,
    ) -> Result<ConeObservation> {
        let region = frame.crop_bgr(&roi)?;
        let mask = self.segmenter.segment(&region, self.colors.range(color))?;
        let obs = self.detector.detect(&mask, color)?;
        if self.keep_masks {
            masks.push((label, mask));
        }
        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UpdateRule;

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const YELLOW: [u8; 4] = [91, 186, 220, 255];
    const BLUE: [u8; 4] = [200, 80, 30, 255];

    fn config() -> Config {
        Config::default()
    }

    fn blank(ts: u64) -> Frame {
        Frame::filled(640, 480, BLACK, ts)
    }

    fn with_cone(ts: u64, roi: Roi, color: [u8; 4]) -> Frame {
        let mut frame = blank(ts);
        frame.paint(Roi::new(roi.x + 20, roi.y + 20, 30, 30), color);
        frame
    }

    #[test]
    fn test_yellow_on_right_during_calibration_sets_clockwise() {
        let config = config();
        let mut pipeline = SteeringPipeline::new(&config);
        for i in 0..5u64 {
            let frame = if i == 2 {
                with_cone(i, config.rois.right, YELLOW)
            } else {
                blank(i)
            };
            let report = pipeline.process(&frame, 0.0).unwrap();
            assert!(report.calibration.is_some());
            assert!(report.steering.is_none());
            assert_eq!(report.angle, 0.0);
        }
        assert_eq!(pipeline.direction(), Direction::Clockwise);

        for i in 5..40u64 {
            let report = pipeline.process(&blank(i), 0.0).unwrap();
            assert!(report.calibration.is_none());
            assert_eq!(report.direction, Direction::Clockwise);
        }
    }

    #[test]
    fn test_no_calibration_sighting_means_counter_clockwise() {
        let mut pipeline = SteeringPipeline::new(&config());
        for i in 0..6u64 {
            pipeline.process(&blank(i), 0.0).unwrap();
        }
        assert_eq!(pipeline.direction(), Direction::CounterClockwise);
    }

    #[test]
    fn test_blue_found_skips_yellow_check() {
        let mut config = config();
        config.calibration.window = 0;
        let mut pipeline = SteeringPipeline::new(&config);

        let mut frame = with_cone(0, config.rois.center, BLUE);
        frame.paint(
            Roi::new(config.rois.center.x + 120, config.rois.center.y + 20, 30, 30),
            YELLOW,
        );
        let report = pipeline.process(&frame, 0.0).unwrap();

        assert!(report.blue.unwrap().found);
        assert!(report.yellow.is_none());
        // counter-clockwise + blue: 0.0 * 0.5 - (-0.025)
        assert!((report.angle - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_yellow_checked_when_blue_missing() {
        let mut config = config();
        config.calibration.window = 0;
        let mut pipeline = SteeringPipeline::new(&config);

        let report = pipeline
            .process(&with_cone(0, config.rois.center, YELLOW), 0.0)
            .unwrap();
        assert!(!report.blue.unwrap().found);
        assert!(report.yellow.unwrap().found);
        // counter-clockwise + yellow: 0.0 * 0.5 - 0.025
        assert!((report.angle + 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_lost_track_resets_angle() {
        let mut config = config();
        config.calibration.window = 0;
        config.steering.update_rule = UpdateRule::Incremental;
        let mut pipeline = SteeringPipeline::new(&config);

        for i in 0..3u64 {
            pipeline
                .process(&with_cone(i, config.rois.center, BLUE), 0.0)
                .unwrap();
        }
        assert!((pipeline.angle() - 0.075).abs() < 1e-6);

        for i in 3..6u64 {
            let report = pipeline.process(&blank(i), 0.0).unwrap();
            assert_eq!(report.steering, Some(SteeringOutcome::Reset));
            assert_eq!(report.angle, 0.0);
        }
    }

    #[test]
    fn test_cone_outside_center_roi_is_ignored() {
        let mut config = config();
        config.calibration.window = 0;
        let mut pipeline = SteeringPipeline::new(&config);
        let frame = with_cone(0, Roi::new(0, 0, 100, 100), BLUE);
        let report = pipeline.process(&frame, 0.0).unwrap();
        assert_eq!(report.steering, Some(SteeringOutcome::Reset));
    }

    #[test]
    fn test_every_frame_is_scored() {
        let mut pipeline = SteeringPipeline::new(&config());
        for i in 0..8u64 {
            let actual = if i % 2 == 0 { 0.0 } else { 0.2 };
            pipeline.process(&blank(i), actual).unwrap();
        }
        let counters = pipeline.evaluator().counters();
        assert_eq!(counters.total_frames, 8);
        assert_eq!(counters.frames_within_tolerance, 4);
        assert!((pipeline.summary().percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_size_mismatch_is_config_error() {
        let mut pipeline = SteeringPipeline::new(&config());
        let err = pipeline
            .process(&Frame::filled(320, 240, BLACK, 0), 0.0)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::FrameSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_diagnostics_keep_masks() {
        let mut config = config();
        config.calibration.window = 0;
        let mut pipeline = SteeringPipeline::new(&config).with_diagnostics(true);
        let report = pipeline.process(&blank(0), 0.0).unwrap();
        let labels: Vec<_> = report.masks.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["Blue Center Image", "Yellow Center Image"]);

        let mut quiet = SteeringPipeline::new(&config);
        assert!(quiet.process(&blank(0), 0.0).unwrap().masks.is_empty());
    }
}
