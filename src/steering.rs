// src/steering.rs

use crate::types::{ConeColor, Direction, SteeringConfig};
use serde::Serialize;

/// What the center ROI showed this frame. Blue wins over yellow: yellow is
/// only looked for when blue was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterSighting {
    Cone(ConeColor),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SteeringOutcome {
    /// A correction was folded into the angle.
    Corrected { delta: f32 },
    /// A cone was seen but the angle was already at or past a bound.
    Held,
    /// No cone anywhere in the center ROI; angle snapped back to 0.0.
    Reset,
}

/// Owns the steering angle for the lifetime of the run.
pub struct SteeringEstimator {
    config: SteeringConfig,
    angle: f32,
}

impl SteeringEstimator {
    pub fn new(config: SteeringConfig) -> Self {
        Self { config, angle: 0.0 }
    }

    #[cfg(test)]
    pub fn with_angle(config: SteeringConfig, angle: f32) -> Self {
        Self { config, angle }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Signed correction for a cone of `color` given the driving direction.
    ///
    /// Blue: `turn_right` clockwise, `turn_left` counter-clockwise.
    /// Yellow mirrors it.
    pub fn delta(&self, direction: Direction, color: ConeColor) -> Option<f32> {
        let (right, left) = (self.config.turn_right, self.config.turn_left);
        match (direction, color) {
            (Direction::Clockwise, ConeColor::Blue) => Some(right),
            (Direction::CounterClockwise, ConeColor::Blue) => Some(left),
            (Direction::Clockwise, ConeColor::Yellow) => Some(left),
            (Direction::CounterClockwise, ConeColor::Yellow) => Some(right),
            (Direction::Undetermined, _) => None,
        }
    }

    pub fn update(&mut self, direction: Direction, sighting: CenterSighting) -> SteeringOutcome {
        let color = match sighting {
            CenterSighting::Cone(color) => color,
            CenterSighting::Nothing => {
                self.angle = 0.0;
                return SteeringOutcome::Reset;
            }
        };

        let delta = match self.delta(direction, color) {
            Some(delta) => delta,
            None => return SteeringOutcome::Held,
        };

        // guard is on the pre-update angle, strictly inside the bounds
        if self.angle > self.config.min && self.angle < self.config.max {
            self.angle = self.config.update_rule.apply(self.angle, delta);
            SteeringOutcome::Corrected { delta }
        } else {
            SteeringOutcome::Held
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UpdateRule;

    const EPS: f32 = 1e-6;

    fn incremental() -> SteeringConfig {
        SteeringConfig {
            update_rule: UpdateRule::Incremental,
            ..SteeringConfig::default()
        }
    }

    #[test]
    fn test_damped_blue_clockwise() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.10);
        let outcome = est.update(Direction::Clockwise, CenterSighting::Cone(ConeColor::Blue));
        assert_eq!(outcome, SteeringOutcome::Corrected { delta: 0.025 });
        assert!((est.angle() - 0.025).abs() < EPS);
    }

    #[test]
    fn test_damped_near_upper_bound_still_corrects() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.29);
        est.update(Direction::Clockwise, CenterSighting::Cone(ConeColor::Blue));
        assert!((est.angle() - 0.12).abs() < EPS);
    }

    #[test]
    fn test_yellow_mirrors_blue() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.10);
        est.update(Direction::Clockwise, CenterSighting::Cone(ConeColor::Yellow));
        // 0.05 - (-0.025)
        assert!((est.angle() - 0.075).abs() < EPS);

        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.10);
        est.update(
            Direction::CounterClockwise,
            CenterSighting::Cone(ConeColor::Yellow),
        );
        assert!((est.angle() - 0.025).abs() < EPS);
    }

    #[test]
    fn test_blue_counter_clockwise_uses_turn_left() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.0);
        est.update(
            Direction::CounterClockwise,
            CenterSighting::Cone(ConeColor::Blue),
        );
        assert!((est.angle() - 0.025).abs() < EPS);
    }

    #[test]
    fn test_nothing_seen_resets_every_frame() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.2);
        for _ in 0..3 {
            let outcome = est.update(Direction::Clockwise, CenterSighting::Nothing);
            assert_eq!(outcome, SteeringOutcome::Reset);
            assert_eq!(est.angle(), 0.0);
        }
    }

    #[test]
    fn test_reset_applies_even_beyond_bounds() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.45);
        est.update(Direction::CounterClockwise, CenterSighting::Nothing);
        assert_eq!(est.angle(), 0.0);
    }

    #[test]
    fn test_guard_holds_at_bound() {
        for start in [0.3f32, -0.3, 0.35, -0.5] {
            let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), start);
            let outcome =
                est.update(Direction::Clockwise, CenterSighting::Cone(ConeColor::Blue));
            assert_eq!(outcome, SteeringOutcome::Held);
            assert_eq!(est.angle(), start);
        }
    }

    #[test]
    fn test_incremental_saturates_then_recovers_after_reset() {
        let mut est = SteeringEstimator::new(incremental());
        // counter-clockwise blue pushes the angle up by 0.025 per frame
        let mut held = false;
        for _ in 0..40 {
            let outcome = est.update(
                Direction::CounterClockwise,
                CenterSighting::Cone(ConeColor::Blue),
            );
            if outcome == SteeringOutcome::Held {
                held = true;
                break;
            }
        }
        assert!(held);
        assert!(est.angle() >= 0.3 - EPS);
        let saturated = est.angle();

        est.update(
            Direction::CounterClockwise,
            CenterSighting::Cone(ConeColor::Blue),
        );
        assert_eq!(est.angle(), saturated);

        est.update(Direction::CounterClockwise, CenterSighting::Nothing);
        assert_eq!(est.angle(), 0.0);
        let outcome = est.update(
            Direction::CounterClockwise,
            CenterSighting::Cone(ConeColor::Blue),
        );
        assert!(matches!(outcome, SteeringOutcome::Corrected { .. }));
    }

    #[test]
    fn test_damped_rule_stays_bounded() {
        let mut est = SteeringEstimator::new(SteeringConfig::default());
        for i in 0..1000 {
            let color = if i % 3 == 0 {
                ConeColor::Yellow
            } else {
                ConeColor::Blue
            };
            est.update(Direction::Clockwise, CenterSighting::Cone(color));
            assert!(est.angle().abs() <= 0.3);
        }
    }

    #[test]
    fn test_undetermined_direction_never_corrects() {
        let mut est = SteeringEstimator::with_angle(SteeringConfig::default(), 0.1);
        let outcome = est.update(Direction::Undetermined, CenterSighting::Cone(ConeColor::Blue));
        assert_eq!(outcome, SteeringOutcome::Held);
        assert_eq!(est.angle(), 0.1);
    }
}
