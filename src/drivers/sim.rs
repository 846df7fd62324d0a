// SleepCam - Host Simulation Drivers
//
// Stand-ins for the ESP32-CAM collaborators so the controller can run (and be
// tested) on a workstation. Each one records what was asked of it.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::drivers::{Camera, Frame, Indicator, PersistentRegion, Power, Streamer};
use crate::error::{Error, Result};
use crate::events::WakeCause;

// ---------------------------------------------------------------------------
// Persistent region
// ---------------------------------------------------------------------------

/// Region held in process memory.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    capacity: usize,
    contents: Option<Vec<u8>>,
    fail_writes: bool,
}

impl MemoryRegion {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            contents: None,
            fail_writes: false,
        }
    }

    pub fn with_contents(capacity: usize, contents: Vec<u8>) -> Self {
        Self {
            contents: Some(contents),
            ..Self::new(capacity)
        }
    }

    /// Every write fails, as if the backing memory were faulty.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }
}

impl PersistentRegion for MemoryRegion {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn read_raw(&self) -> Option<Vec<u8>> {
        self.contents.clone()
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::PersistenceWrite("simulated write fault".into()));
        }
        if bytes.len() > self.capacity {
            return Err(Error::PersistenceWrite(format!(
                "{} bytes exceeds {} byte region",
                bytes.len(),
                self.capacity
            )));
        }
        self.contents = Some(bytes.to_vec());
        Ok(())
    }
}

/// Region backed by a file, so it survives between simulator runs the way
/// RTC memory survives deep sleep. Deleting the file is a cold boot.
#[derive(Debug, Clone)]
pub struct FileRegion {
    path: PathBuf,
    capacity: usize,
}

impl FileRegion {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl PersistentRegion for FileRegion {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn read_raw(&self) -> Option<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Cannot read {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.capacity {
            return Err(Error::PersistenceWrite(format!(
                "{} bytes exceeds {} byte region",
                bytes.len(),
                self.capacity
            )));
        }

        // Write-then-rename so an interrupted run never leaves half a record.
        let tmp = self.path.with_extension("tmp");
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| {
            Error::PersistenceWrite(format!("{}: {}", self.path.display(), e))
        })
    }
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Returns pre-recorded frames in order, then fails like a dead sensor.
#[derive(Debug, Default)]
pub struct ReplayCamera {
    frames: VecDeque<Frame>,
}

impl ReplayCamera {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Load raw 8-bit grayscale dumps, one file per capture.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let frames = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                fs::read(path).map(Frame::new).map_err(|e| {
                    Error::HardwareIo(format!("cannot load frame {}: {}", path.display(), e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Camera for ReplayCamera {
    fn capture(&mut self) -> Result<Frame> {
        self.frames
            .pop_front()
            .ok_or_else(|| Error::HardwareIo("no frame available from replay camera".into()))
    }
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimLed {
    name: &'static str,
    lit: bool,
    transitions: Vec<bool>,
}

impl SimLed {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lit: false,
            transitions: Vec::new(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }

    /// Every requested level, in order.
    pub fn transitions(&self) -> &[bool] {
        &self.transitions
    }

    fn set(&mut self, on: bool) {
        log::debug!("{} LED {}", self.name, if on { "on" } else { "off" });
        self.lit = on;
        self.transitions.push(on);
    }
}

impl Indicator for SimLed {
    fn set_on(&mut self) {
        self.set(true);
    }

    fn set_off(&mut self) {
        self.set(false);
    }
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimPower {
    wake: WakeCause,
    real_time: bool,
    fail_sleep: bool,
    delays: Vec<Duration>,
    deep_sleeps: Vec<Duration>,
}

impl SimPower {
    pub fn new(wake: WakeCause) -> Self {
        Self {
            wake,
            real_time: false,
            fail_sleep: false,
            delays: Vec::new(),
            deep_sleeps: Vec::new(),
        }
    }

    /// Actually wait out delays instead of only recording them.
    pub fn real_time(mut self) -> Self {
        self.real_time = true;
        self
    }

    /// Refuse to arm the wake-up timer, like a rejected sleep request.
    pub fn failing_sleep(mut self) -> Self {
        self.fail_sleep = true;
        self
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn deep_sleeps(&self) -> &[Duration] {
        &self.deep_sleeps
    }
}

impl Power for SimPower {
    fn wake_cause(&self) -> WakeCause {
        self.wake
    }

    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
        if self.real_time {
            thread::sleep(duration);
        }
    }

    fn enter_deep_sleep(&mut self, interval: Duration) -> Result<()> {
        if self.fail_sleep {
            return Err(Error::HardwareIo(format!(
                "simulated wake-up timer rejected {} ms",
                interval.as_millis()
            )));
        }
        log::info!(
            "Simulated deep sleep for {} ms; run again to wake",
            interval.as_millis()
        );
        self.deep_sleeps.push(interval);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// Records hold requests without waiting.
#[derive(Debug, Default, Clone)]
pub struct RecordingStreamer {
    holds: Vec<Duration>,
}

impl RecordingStreamer {
    pub fn holds(&self) -> &[Duration] {
        &self.holds
    }
}

impl Streamer for RecordingStreamer {
    fn stream(&mut self, hold: Duration) -> Result<()> {
        self.holds.push(hold);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_region_round_trips_and_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let mut region = FileRegion::new(dir.path().join("rtc.bin"), 64);
        assert_eq!(region.read_raw(), None);

        region.write_raw(b"abc").unwrap();
        assert_eq!(region.read_raw(), Some(b"abc".to_vec()));
        assert!(!dir.path().join("rtc.tmp").exists());
    }

    #[test]
    fn regions_refuse_oversized_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = FileRegion::new(dir.path().join("rtc.bin"), 2);
        let mut memory = MemoryRegion::new(2);
        assert!(matches!(file.write_raw(b"abc"), Err(Error::PersistenceWrite(_))));
        assert!(matches!(memory.write_raw(b"abc"), Err(Error::PersistenceWrite(_))));
        assert!(!file.exists());
        assert_eq!(memory.contents(), None);
    }

    #[test]
    fn replay_camera_runs_dry() {
        let mut camera = ReplayCamera::new([Frame::uniform(4, 1)]);
        assert_eq!(camera.capture().unwrap().len(), 4);
        assert_eq!(camera.remaining(), 0);
        assert!(matches!(camera.capture(), Err(Error::HardwareIo(_))));
    }

    #[test]
    fn replay_camera_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.raw");
        assert!(matches!(
            ReplayCamera::from_files(&[missing]),
            Err(Error::HardwareIo(_))
        ));
    }
}
