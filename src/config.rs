// SleepCam - Hardware & System Configuration
// Target: AI-Thinker ESP32-CAM (ESP32 + OV2640, 4 MB PSRAM)

use std::time::Duration;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (AI-Thinker ESP32-CAM)
// ---------------------------------------------------------------------------
pub const PIN_PROCESSING_LED: i32 = 33; // On-board red LED (active LOW)
pub const PIN_FLASH_LED: i32 = 4;       // High-power white flash LED (active HIGH)

// ---------------------------------------------------------------------------
// Camera (OV2640 on the AI-Thinker SCCB/DVP wiring)
// ---------------------------------------------------------------------------
pub const CAM_PIN_PWDN: i32 = 32;
pub const CAM_PIN_RESET: i32 = -1; // Not routed
pub const CAM_PIN_XCLK: i32 = 0;
pub const CAM_PIN_SIOD: i32 = 26;
pub const CAM_PIN_SIOC: i32 = 27;
pub const CAM_PIN_D7: i32 = 35;
pub const CAM_PIN_D6: i32 = 34;
pub const CAM_PIN_D5: i32 = 39;
pub const CAM_PIN_D4: i32 = 36;
pub const CAM_PIN_D3: i32 = 21;
pub const CAM_PIN_D2: i32 = 19;
pub const CAM_PIN_D1: i32 = 18;
pub const CAM_PIN_D0: i32 = 5;
pub const CAM_PIN_VSYNC: i32 = 25;
pub const CAM_PIN_HREF: i32 = 23;
pub const CAM_PIN_PCLK: i32 = 22;
pub const CAM_XCLK_FREQ_HZ: i32 = 20_000_000;

// ---------------------------------------------------------------------------
// Frame geometry
// ---------------------------------------------------------------------------
pub const FRAME_WIDTH: u32 = 96;
pub const FRAME_HEIGHT: u32 = 96;
pub const FRAME_LEN: usize = (FRAME_WIDTH as usize) * (FRAME_HEIGHT as usize); // 9216

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
pub const DEEP_SLEEP_INTERVAL_SECS: u64 = 2;  // Idle sleep, reused as the active hold
pub const CAPTURE_SETTLE_MS: u64 = 200;       // Before and after each capture

// ---------------------------------------------------------------------------
// Motion detection
// ---------------------------------------------------------------------------
pub const MOTION_THRESHOLD: f64 = 20.0;       // Mean-intensity delta out of 255 (~8 %)
pub const BRIGHTNESS_DECIMALS: i32 = 6;       // Fractional digits kept in the statistic
pub const BRIGHTNESS_MAX: f64 = 255.0;

// ---------------------------------------------------------------------------
// Persistent (RTC slow memory) region
// ---------------------------------------------------------------------------
pub const RTC_REGION_CAPACITY: usize = 256;   // Bytes, header included

/// Immutable detector settings, fixed when the controller is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub deep_sleep_interval: Duration,
    pub motion_threshold: f64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub capture_settle: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            deep_sleep_interval: Duration::from_secs(DEEP_SLEEP_INTERVAL_SECS),
            motion_threshold: MOTION_THRESHOLD,
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
            capture_settle: Duration::from_millis(CAPTURE_SETTLE_MS),
        }
    }
}

impl DetectorConfig {
    pub fn with_deep_sleep_interval(mut self, interval: Duration) -> Self {
        self.deep_sleep_interval = interval;
        self
    }

    pub fn with_motion_threshold(mut self, threshold: f64) -> Self {
        self.motion_threshold = threshold;
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn with_capture_settle(mut self, settle: Duration) -> Self {
        self.capture_settle = settle;
        self
    }

    /// Number of pixels in one frame sample.
    pub fn frame_len(&self) -> usize {
        self.frame_width as usize * self.frame_height as usize
    }

    /// Reject settings the power-cycle loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(Error::Config(format!(
                "frame size {}x{} has no pixels",
                self.frame_width, self.frame_height
            )));
        }
        if self.deep_sleep_interval.is_zero() {
            return Err(Error::Config("deep sleep interval must be non-zero".into()));
        }
        if !self.motion_threshold.is_finite() || self.motion_threshold < 0.0 {
            return Err(Error::Config(format!(
                "motion threshold {} must be a finite, non-negative brightness delta",
                self.motion_threshold
            )));
        }
        Ok(())
    }
}
