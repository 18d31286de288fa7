// src/calibration.rs
//
// Fixes the driving direction from the first `window` frames. A yellow cone
// in the right ROI means the yellow boundary is on our right, i.e. we are
// going clockwise. No sighting in the whole window means counter-clockwise.

use crate::types::Direction;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Calibrating,
    Determined,
}

pub struct DirectionCalibrator {
    window: usize,
    frames_seen: usize,
    state: CalibrationState,
    direction: Direction,
}

impl DirectionCalibrator {
    pub fn new(window: usize) -> Self {
        let mut calibrator = Self {
            window,
            frames_seen: 0,
            state: CalibrationState::Calibrating,
            direction: Direction::Undetermined,
        };
        if window == 0 {
            calibrator.finish();
        }
        calibrator
    }

    #[cfg(test)]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_calibrating(&self) -> bool {
        self.state == CalibrationState::Calibrating
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[cfg(test)]
    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    /// Feeds one calibration frame. Does nothing once Determined.
    pub fn observe(&mut self, yellow_on_right: bool) -> Direction {
        if self.state == CalibrationState::Determined {
            return self.direction;
        }

        // first sighting wins; later misses never undo it
        if yellow_on_right && self.direction == Direction::Undetermined {
            self.direction = Direction::Clockwise;
            info!(
                "↻ Yellow cone on the right at calibration frame {}",
                self.frames_seen
            );
        }

        self.frames_seen += 1;
        if self.frames_seen >= self.window {
            self.finish();
        }
        self.direction
    }

    fn finish(&mut self) {
        if self.direction == Direction::Undetermined {
            self.direction = Direction::CounterClockwise;
        }
        self.state = CalibrationState::Determined;
        info!(
            "✓ Calibration complete after {} frame(s). Direction: {}",
            self.frames_seen,
            self.direction.as_str()
        );
    }
}
