// SleepCam - Motion-Gated Deep-Sleep Camera
//
// Each wake cycle samples one grayscale frame, reduces it to a mean
// brightness and compares that with the brightness stored in RTC memory by
// the previous cycle. A large enough change keeps the device awake and
// streaming; otherwise it goes straight back to deep sleep.
//
// Everything here except `drivers::{camera, led, power, rtc}` is
// hardware-independent and builds on the host. `cli` exists only there.

#[cfg(not(target_os = "espidf"))]
pub mod cli;
pub mod config;
pub mod controller;
pub mod drivers;
pub mod error;
pub mod events;
pub mod mean;
pub mod motion;
pub mod store;

pub use config::DetectorConfig;
pub use controller::{Board, Controller};
pub use error::{Error, Result};
pub use events::{Classification, CycleReport, CycleState, MotionDecision, NextAction, WakeCause};
pub use mean::{mean, Brightness};
pub use motion::MotionDetector;
pub use store::{CycleRecord, CycleStore, LoadStatus};
