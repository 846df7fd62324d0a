// SleepCam - Hardware Collaborators
//
// The controller only talks to hardware through these traits. On the
// ESP32-CAM they are backed by esp-idf (camera, rtc, led, power); on any
// other target the `sim` module provides host-side stand-ins.

use std::time::Duration;

use crate::error::Result;
use crate::events::WakeCause;

pub mod stream;

#[cfg(target_os = "espidf")]
pub mod camera;
#[cfg(target_os = "espidf")]
pub mod led;
#[cfg(target_os = "espidf")]
pub mod power;
#[cfg(target_os = "espidf")]
pub mod rtc;

#[cfg(not(target_os = "espidf"))]
pub mod sim;

/// One grayscale capture, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
}

impl Frame {
    pub fn new(pixels: Vec<u8>) -> Self {
        Self { pixels }
    }

    /// A frame where every pixel has the same intensity.
    pub fn uniform(len: usize, value: u8) -> Self {
        Self::new(vec![value; len])
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

pub trait Camera {
    /// Grab one frame of exactly width x height pixels.
    fn capture(&mut self) -> Result<Frame>;
}

/// Memory that survives deep sleep but not a power-off.
pub trait PersistentRegion {
    /// Largest image `write_raw` accepts.
    fn capacity(&self) -> usize;

    /// `None` when nothing has been written since power-on.
    fn read_raw(&self) -> Option<Vec<u8>>;

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()>;
}

/// A binary, purely observational output such as an LED.
pub trait Indicator {
    fn set_on(&mut self);
    fn set_off(&mut self);
}

pub trait Power {
    fn wake_cause(&self) -> WakeCause;

    /// Short blocking pause (hardware settling).
    fn delay(&mut self, duration: Duration);

    /// Power down for `interval`. On hardware this never returns; wake-up
    /// restarts the firmware from the top. Simulated platforms return
    /// `Ok(())` to mark the end of the process instance.
    fn enter_deep_sleep(&mut self, interval: Duration) -> Result<()>;
}

/// Receives control while motion is being held in the active state.
pub trait Streamer {
    fn stream(&mut self, hold: Duration) -> Result<()>;
}
