// SleepCam - Motion Decision
//
// Stateless comparison of the current brightness against the previous
// cycle's. Equal-to-threshold differences are idle.

use crate::events::{Classification, MotionDecision};
use crate::mean::Brightness;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDetector {
    threshold: f64,
}

impl MotionDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn evaluate(&self, current: Brightness, previous: Brightness) -> MotionDecision {
        let difference = current.abs_diff(previous);
        let classification = if difference > self.threshold {
            Classification::Motion
        } else {
            Classification::Idle
        };
        MotionDecision {
            classification,
            difference,
        }
    }
}
