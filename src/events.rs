// SleepCam - Cycle States & Outcomes

use std::time::Duration;

use crate::mean::Brightness;
use crate::store::CycleRecord;

// ---------------------------------------------------------------------------
// Device cycle state (in-process only, never persisted)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Startup,
    Capturing,
    Evaluating,
    Active,
    Sleeping,
}

// ---------------------------------------------------------------------------
// Motion classification
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Motion,
    Idle,
}

impl Classification {
    /// Label used in log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDecision {
    pub classification: Classification,
    /// `|current - previous|` in brightness units.
    pub difference: f64,
}

// ---------------------------------------------------------------------------
// Why this process instance is running
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Power-on or reset; the persistent region was re-initialised.
    ColdBoot,
    /// Timer wake-up after a deep sleep entered by this firmware.
    DeepSleepTimer,
}

// ---------------------------------------------------------------------------
// Result of one pass through the controller
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextAction {
    /// Motion was held for the streaming interval; capture again immediately.
    Resample,
    /// Power down for the given interval.
    DeepSleep(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// `None` when the frame could not produce a statistic.
    pub brightness: Option<Brightness>,
    pub decision: Option<MotionDecision>,
    /// The record that reached the persistent region, if the write succeeded.
    pub persisted: Option<CycleRecord>,
    pub next: NextAction,
}
