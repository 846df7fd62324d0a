// SleepCam - Streaming Mean
//
// Brightness of a grayscale frame, computed with an incremental (Welford
// style) average so no intermediate sum ever grows with the frame size.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{BRIGHTNESS_DECIMALS, BRIGHTNESS_MAX};
use crate::error::{Error, Result};

/// Mean intensity of a frame in `[0, 255]`, rounded to six fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Brightness(f64);

impl Brightness {
    pub const MAX: Brightness = Brightness(BRIGHTNESS_MAX);

    /// Validate and round a raw value.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(0.0..=BRIGHTNESS_MAX).contains(&value) {
            return Err(Error::InvalidInput(format!(
                "brightness {value} outside 0..={BRIGHTNESS_MAX}"
            )));
        }
        Ok(Self(round_to_precision(value)))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Absolute difference, re-rounded so both operands' precision carries over.
    pub fn abs_diff(self, other: Brightness) -> f64 {
        round_to_precision((self.0 - other.0).abs())
    }
}

impl TryFrom<f64> for Brightness {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Brightness> for f64 {
    fn from(brightness: Brightness) -> f64 {
        brightness.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Round to [`BRIGHTNESS_DECIMALS`] fractional digits, exact ties to even.
pub fn round_to_precision(value: f64) -> f64 {
    let scale = 10f64.powi(BRIGHTNESS_DECIMALS);
    (value * scale).round_ties_even() / scale
}

/// Arithmetic mean of `samples`, updated one pixel at a time.
///
/// Returns [`Error::InvalidInput`] for an empty slice instead of dividing by
/// zero.
pub fn mean(samples: &[u8]) -> Result<Brightness> {
    if samples.is_empty() {
        return Err(Error::InvalidInput("frame sample has no pixels".into()));
    }

    let mut avg = 0.0f64;
    for (i, &value) in samples.iter().enumerate() {
        avg += (f64::from(value) - avg) / (i + 1) as f64;
    }

    // Accumulated float error can only nudge the average, never leave the range.
    Brightness::new(avg.clamp(0.0, BRIGHTNESS_MAX))
}
