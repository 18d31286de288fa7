// src/performance.rs
//
// Scores the estimate against ground truth and keeps the running accuracy.

use crate::types::{Direction, PerformanceConfig, ToleranceProfile};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceCounters {
    pub frames_within_tolerance: u64,
    pub total_frames: u64,
}

impl PerformanceCounters {
    /// Fresh from both counters every call; 0.0 before the first frame.
    pub fn percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_within_tolerance as f64 / self.total_frames as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub allowed: f64,
    pub deviation: f64,
    pub within_tolerance: bool,
    pub percentage: f64,
}

pub struct PerformanceEvaluator {
    tolerance: ToleranceProfile,
    pass_mark: f64,
    counters: PerformanceCounters,
    started_at: Instant,
}

impl PerformanceEvaluator {
    pub fn new(config: &PerformanceConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            pass_mark: config.pass_mark,
            counters: PerformanceCounters::default(),
            started_at: Instant::now(),
        }
    }

    pub fn allowed_deviation(&self, estimated: f32) -> f64 {
        let magnitude = (estimated as f64).abs();
        match self.tolerance {
            ToleranceProfile::Adaptive {
                small_angle,
                floor,
                ratio,
            } => {
                if magnitude <= small_angle {
                    floor
                } else {
                    ratio * magnitude
                }
            }
            ToleranceProfile::Fixed { allowed } => allowed,
        }
    }

    pub fn evaluate(&mut self, estimated: f32, actual: f32) -> Evaluation {
        let allowed = self.allowed_deviation(estimated);
        let deviation = (actual as f64 - estimated as f64).abs();
        let within_tolerance = deviation <= allowed;

        self.counters.total_frames += 1;
        if within_tolerance {
            self.counters.frames_within_tolerance += 1;
        }

        Evaluation {
            allowed,
            deviation,
            within_tolerance,
            percentage: self.counters.percentage(),
        }
    }

    #[cfg(test)]
    pub fn counters(&self) -> PerformanceCounters {
        self.counters
    }

    pub fn meets_pass_mark(&self) -> bool {
        self.counters.percentage() >= self.pass_mark
    }

    pub fn summary(&self, direction: Direction) -> RunSummary {
        let elapsed_secs = self.started_at.elapsed().as_secs_f64();
        let fps = if elapsed_secs > 0.01 {
            self.counters.total_frames as f64 / elapsed_secs
        } else {
            0.0
        };
        RunSummary {
            total_frames: self.counters.total_frames,
            frames_within_tolerance: self.counters.frames_within_tolerance,
            percentage: self.counters.percentage(),
            pass_mark: self.pass_mark,
            passed: self.meets_pass_mark(),
            direction,
            elapsed_secs,
            fps,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_frames: u64,
    pub frames_within_tolerance: u64,
    pub percentage: f64,
    pub pass_mark: f64,
    pub passed: bool,
    pub direction: Direction,
    pub elapsed_secs: f64,
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adaptive() -> PerformanceEvaluator {
        PerformanceEvaluator::new(&PerformanceConfig::default())
    }

    fn fixed(allowed: f64) -> PerformanceEvaluator {
        PerformanceEvaluator::new(&PerformanceConfig {
            tolerance: ToleranceProfile::Fixed { allowed },
            pass_mark: 40.0,
        })
    }

    #[test]
    fn test_adaptive_proportional_tolerance() {
        let mut eval = adaptive();
        assert!((eval.allowed_deviation(0.02) - 0.006).abs() < 1e-6);

        let result = eval.evaluate(0.02, 0.024);
        assert!(result.within_tolerance);
        assert!((result.deviation - 0.004).abs() < 1e-6);
        assert_eq!(eval.counters().frames_within_tolerance, 1);
    }

    #[test]
    fn test_adaptive_floor_near_zero() {
        let eval = adaptive();
        assert_eq!(eval.allowed_deviation(0.0), 0.05);
        assert_eq!(eval.allowed_deviation(-0.005), 0.05);
    }

    #[test]
    fn test_adaptive_outside_tolerance() {
        let mut eval = adaptive();
        let result = eval.evaluate(0.1, 0.2);
        assert!(!result.within_tolerance);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(eval.counters().total_frames, 1);
    }

    #[test]
    fn test_fixed_ignores_magnitude() {
        let mut eval = fixed(0.05);
        assert_eq!(eval.allowed_deviation(0.25), 0.05);
        assert!(!eval.evaluate(0.25, 0.32).within_tolerance);
        assert!(eval.evaluate(0.25, 0.29).within_tolerance);
    }

    #[test]
    fn test_percentage_stays_in_range_and_is_recomputed() {
        let mut eval = adaptive();
        let pairs = [(0.0, 0.0), (0.1, 0.5), (0.0, 0.04), (0.2, -0.2), (0.0, 0.0)];
        let mut last_total = 0;
        for (est, actual) in pairs {
            let result = eval.evaluate(est, actual);
            let counters = eval.counters();
            assert!(counters.total_frames > last_total);
            last_total = counters.total_frames;
            assert!((0.0..=100.0).contains(&result.percentage));
            let expected =
                counters.frames_within_tolerance as f64 / counters.total_frames as f64 * 100.0;
            assert_eq!(result.percentage, expected);
        }
        assert_eq!(eval.counters().frames_within_tolerance, 3);
        assert!((eval.counters().percentage() - 60.0).abs() < 1e-9);
        assert!(eval.meets_pass_mark());
    }

    #[test]
    fn test_empty_counters_report_zero() {
        assert_eq!(PerformanceCounters::default().percentage(), 0.0);
        let summary = adaptive().summary(Direction::Undetermined);
        assert_eq!(summary.total_frames, 0);
        assert!(!summary.passed);
    }
}
