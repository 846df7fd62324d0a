// SleepCam - Power-Cycle Controller
//
// One pass per wake:
//
//   STARTUP    processing LED on, load the cycle record
//   CAPTURING  (flash on first activation) settle, capture, settle
//   EVALUATING brightness vs previous, persist successor record
//   ACTIVE     motion: hold flash on for the streaming interval, resample
//   SLEEPING   idle: deep sleep for the same interval
//
// The record is written before branching, so a power loss during the hold or
// the sleep cannot lose it. Every pass compares against the frame right
// before it, including consecutive motion passes.

use crate::config::DetectorConfig;
use crate::drivers::{Camera, Frame, Indicator, PersistentRegion, Power, Streamer};
use crate::error::{Error, Result};
use crate::events::{Classification, CycleReport, CycleState, NextAction, WakeCause};
use crate::mean::{self, Brightness};
use crate::motion::MotionDetector;
use crate::store::{CycleRecord, CycleStore};

/// Every collaborator the controller needs, handed over at construction.
pub struct Board<C, R, I, P, S> {
    pub camera: C,
    pub region: R,
    pub processing_led: I,
    pub flash_led: I,
    pub power: P,
    pub streamer: S,
}

pub struct Controller<C, R, I, P, S> {
    config: DetectorConfig,
    detector: MotionDetector,
    camera: C,
    store: CycleStore<R>,
    processing_led: I,
    flash_led: I,
    power: P,
    streamer: S,
    state: CycleState,
    // Lives only as long as this process; deep sleep resets it via wake cause.
    first_activation: bool,
}

impl<C, R, I, P, S> Controller<C, R, I, P, S>
where
    C: Camera,
    R: PersistentRegion,
    I: Indicator,
    P: Power,
    S: Streamer,
{
    pub fn new(config: DetectorConfig, board: Board<C, R, I, P, S>) -> Result<Self> {
        config.validate()?;

        let wake = board.power.wake_cause();
        log::info!("Wake cause: {:?}", wake);

        Ok(Self {
            detector: MotionDetector::new(config.motion_threshold),
            config,
            camera: board.camera,
            store: CycleStore::new(board.region),
            processing_led: board.processing_led,
            flash_led: board.flash_led,
            power: board.power,
            streamer: board.streamer,
            state: CycleState::Startup,
            first_activation: wake == WakeCause::ColdBoot,
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn first_activation(&self) -> bool {
        self.first_activation
    }

    pub fn store(&self) -> &CycleStore<R> {
        &self.store
    }

    pub fn processing_led(&self) -> &I {
        &self.processing_led
    }

    pub fn flash_led(&self) -> &I {
        &self.flash_led
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub fn streamer(&self) -> &S {
        &self.streamer
    }

    /// Hand the collaborators back, e.g. to start the next simulated wake.
    pub fn into_board(self) -> Board<C, R, I, P, S> {
        Board {
            camera: self.camera,
            region: self.store.into_region(),
            processing_led: self.processing_led,
            flash_led: self.flash_led,
            power: self.power,
            streamer: self.streamer,
        }
    }

    /// Run passes until the device goes to deep sleep.
    ///
    /// On hardware this only returns with an error; a simulated platform
    /// returns `Ok(())` once its deep sleep has been requested.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let report = self.run_cycle()?;
            if let NextAction::DeepSleep(interval) = report.next {
                self.flash_led.set_off();
                log::info!("Entering deep sleep for {} ms", interval.as_millis());
                return self.power.enter_deep_sleep(interval);
            }
        }
    }

    /// One pass from load to decision. Performs the active hold itself, but
    /// leaves the deep sleep to [`Controller::run`].
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        self.processing_led.set_on();
        let loaded = self.store.load();

        self.enter(CycleState::Capturing);
        let frame = match self.capture() {
            Ok(frame) => frame,
            Err(e) => {
                self.processing_led.set_off();
                return Err(e);
            }
        };
        let current = match mean::mean(frame.pixels()) {
            Ok(brightness) => brightness,
            Err(e) => return Ok(self.fail_closed(e)),
        };
        if frame.len() != self.config.frame_len() {
            self.processing_led.set_off();
            return Err(Error::HardwareIo(format!(
                "camera returned {} pixels, expected {}",
                frame.len(),
                self.config.frame_len()
            )));
        }

        self.enter(CycleState::Evaluating);
        let previous = loaded
            .as_ref()
            .map_or(current, |record| record.previous_or(current));
        let decision = self.detector.evaluate(current, previous);
        log::info!(
            "Brightness {} (previous {}), difference {:.6} -> {}",
            current,
            previous,
            decision.difference,
            decision.classification.display_name()
        );

        let persisted = self.persist(loaded.as_ref(), current);
        self.processing_led.set_off();

        let next = match decision.classification {
            Classification::Motion => {
                self.hold_active();
                NextAction::Resample
            }
            Classification::Idle => {
                self.enter(CycleState::Sleeping);
                NextAction::DeepSleep(self.config.deep_sleep_interval)
            }
        };

        Ok(CycleReport {
            brightness: Some(current),
            decision: Some(decision),
            persisted,
            next,
        })
    }

    fn enter(&mut self, next: CycleState) {
        log::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn capture(&mut self) -> Result<Frame> {
        let flash = self.first_activation;
        if flash {
            self.flash_led.set_on();
        }
        self.power.delay(self.config.capture_settle);
        let frame = self.camera.capture();
        self.power.delay(self.config.capture_settle);
        if flash {
            self.flash_led.set_off();
        }
        frame
    }

    fn persist(&mut self, loaded: Option<&CycleRecord>, current: Brightness) -> Option<CycleRecord> {
        let record = CycleRecord::successor(loaded, current);
        match self.store.store(&record) {
            Ok(()) => Some(record),
            Err(e) => {
                // Carry on with the stale record rather than stall the loop.
                log::error!("Cycle record not saved: {}", e);
                None
            }
        }
    }

    fn hold_active(&mut self) {
        self.enter(CycleState::Active);
        self.flash_led.set_on();
        if let Err(e) = self.streamer.stream(self.config.deep_sleep_interval) {
            log::warn!("Streaming hold ended early: {}", e);
        }
        self.first_activation = false;
        self.enter(CycleState::Capturing);
    }

    /// No trustworthy statistic: skip the decision and the write, go to sleep.
    fn fail_closed(&mut self, err: Error) -> CycleReport {
        log::error!("Cycle aborted before decision: {}", err);
        self.processing_led.set_off();
        self.enter(CycleState::Sleeping);
        CycleReport {
            brightness: None,
            decision: None,
            persisted: None,
            next: NextAction::DeepSleep(self.config.deep_sleep_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::drivers::sim::{MemoryRegion, RecordingStreamer, ReplayCamera, SimLed, SimPower};
    use crate::store::LoadStatus;

    type TestController =
        Controller<ReplayCamera, MemoryRegion, SimLed, SimPower, RecordingStreamer>;

    fn frame(value: u8) -> Frame {
        Frame::uniform(crate::config::FRAME_LEN, value)
    }

    fn controller(frames: Vec<Frame>, region: MemoryRegion, wake: WakeCause) -> TestController {
        let board = Board {
            camera: ReplayCamera::new(frames),
            region,
            processing_led: SimLed::new("processing"),
            flash_led: SimLed::new("flash"),
            power: SimPower::new(wake),
            streamer: RecordingStreamer::default(),
        };
        Controller::new(DetectorConfig::default(), board).unwrap()
    }

    fn seeded_region(previous: f64) -> MemoryRegion {
        let mut store = CycleStore::new(MemoryRegion::new(256));
        store
            .store(&CycleRecord::new(5, Brightness::new(previous).unwrap()))
            .unwrap();
        store.into_region()
    }

    #[test]
    fn first_run_is_idle_with_boot_zero() {
        let mut ctl = controller(vec![frame(90)], MemoryRegion::new(256), WakeCause::ColdBoot);
        let report = ctl.run_cycle().unwrap();

        let decision = report.decision.unwrap();
        assert_eq!(decision.classification, Classification::Idle);
        assert_eq!(decision.difference, 0.0);
        assert_eq!(report.persisted.unwrap().boot_num, Some(0));
        assert_eq!(report.next, NextAction::DeepSleep(Duration::from_secs(2)));
        assert_eq!(ctl.state(), CycleState::Sleeping);
        assert_eq!(ctl.processing_led().transitions(), &[true, false]);
    }

    #[test]
    fn cold_boot_flashes_around_capture() {
        let mut ctl = controller(vec![frame(90)], MemoryRegion::new(256), WakeCause::ColdBoot);
        ctl.run_cycle().unwrap();
        assert_eq!(ctl.flash_led().transitions(), &[true, false]);
        assert_eq!(ctl.power().delays(), &[Duration::from_millis(200); 2]);
    }

    #[test]
    fn timer_wake_does_not_flash() {
        let mut ctl = controller(vec![frame(90)], seeded_region(90.0), WakeCause::DeepSleepTimer);
        assert!(!ctl.first_activation());
        ctl.run_cycle().unwrap();
        assert!(ctl.flash_led().transitions().is_empty());
    }

    #[test]
    fn motion_holds_and_resamples() {
        let mut ctl = controller(vec![frame(130)], seeded_region(100.0), WakeCause::ColdBoot);
        let report = ctl.run_cycle().unwrap();

        let decision = report.decision.unwrap();
        assert_eq!(decision.classification, Classification::Motion);
        assert_eq!(decision.difference, 30.0);
        assert_eq!(report.next, NextAction::Resample);
        assert_eq!(report.persisted.unwrap(), CycleRecord::new(6, Brightness::new(130.0).unwrap()));

        assert_eq!(ctl.state(), CycleState::Capturing);
        assert!(!ctl.first_activation());
        assert!(ctl.flash_led().is_on());
        assert_eq!(ctl.streamer().holds(), &[Duration::from_secs(2)]);
        assert!(ctl.power().deep_sleeps().is_empty());
    }

    #[test]
    fn consecutive_motion_compares_with_the_frame_just_before() {
        let frames = vec![frame(130), frame(160), frame(170)];
        let mut ctl = controller(frames, seeded_region(100.0), WakeCause::DeepSleepTimer);

        let first = ctl.run_cycle().unwrap().decision.unwrap();
        let second = ctl.run_cycle().unwrap().decision.unwrap();
        let third = ctl.run_cycle().unwrap().decision.unwrap();

        assert_eq!(first.classification, Classification::Motion);
        assert_eq!(second.difference, 30.0);
        assert_eq!(second.classification, Classification::Motion);
        // 170 is 70 above the pre-motion baseline but only 10 above 160.
        assert_eq!(third.difference, 10.0);
        assert_eq!(third.classification, Classification::Idle);

        let record = ctl.store().load().unwrap();
        assert_eq!(record.boot_num, Some(8));
    }

    #[test]
    fn flash_stays_off_on_resample_capture() {
        let frames = vec![frame(130), frame(131)];
        let mut ctl = controller(frames, seeded_region(100.0), WakeCause::ColdBoot);
        ctl.run_cycle().unwrap();
        ctl.run_cycle().unwrap();
        // Flash pulse around the first capture, then held on for the motion.
        assert_eq!(ctl.flash_led().transitions(), &[true, false, true]);
    }

    #[test]
    fn empty_frame_fails_closed_without_writing() {
        let region = seeded_region(100.0);
        let before = region.contents().map(<[u8]>::to_vec);
        let mut ctl = controller(vec![Frame::new(Vec::new())], region, WakeCause::DeepSleepTimer);

        let report = ctl.run_cycle().unwrap();
        assert_eq!(report.decision, None);
        assert_eq!(report.persisted, None);
        assert_eq!(report.next, NextAction::DeepSleep(Duration::from_secs(2)));
        assert_eq!(ctl.store().region().contents().map(<[u8]>::to_vec), before);
        assert!(!ctl.processing_led().is_on());
    }

    #[test]
    fn wrong_frame_size_is_a_hardware_error() {
        let mut ctl = controller(
            vec![Frame::uniform(100, 10)],
            MemoryRegion::new(256),
            WakeCause::ColdBoot,
        );
        assert!(matches!(ctl.run_cycle(), Err(Error::HardwareIo(_))));
        assert_eq!(ctl.processing_led().transitions(), &[true, false]);
    }

    #[test]
    fn camera_failure_ends_the_process() {
        let mut ctl = controller(Vec::new(), MemoryRegion::new(256), WakeCause::ColdBoot);
        assert!(matches!(ctl.run(), Err(Error::HardwareIo(_))));
        assert!(!ctl.flash_led().is_on());
        assert!(!ctl.processing_led().is_on());
        assert_eq!(ctl.processing_led().transitions(), &[true, false]);
        assert!(ctl.power().deep_sleeps().is_empty());
    }

    #[test]
    fn processing_led_spans_load_to_persist() {
        let frames = vec![frame(90), frame(91)];
        let mut ctl = controller(frames, seeded_region(40.0), WakeCause::DeepSleepTimer);
        ctl.run_cycle().unwrap();
        assert_eq!(ctl.processing_led().transitions(), &[true, false]);

        // Each resample pass signals processing again.
        ctl.run_cycle().unwrap();
        assert_eq!(ctl.processing_led().transitions(), &[true, false, true, false]);
    }

    #[test]
    fn failing_sleep_primitive_is_a_hardware_error() {
        let board = Board {
            camera: ReplayCamera::new([frame(90)]),
            region: MemoryRegion::new(256),
            processing_led: SimLed::new("processing"),
            flash_led: SimLed::new("flash"),
            power: SimPower::new(WakeCause::ColdBoot).failing_sleep(),
            streamer: RecordingStreamer::default(),
        };
        let mut ctl = Controller::new(DetectorConfig::default(), board).unwrap();

        assert!(matches!(ctl.run(), Err(Error::HardwareIo(_))));
        assert_eq!(ctl.state(), CycleState::Sleeping);
        // The record was already persisted before the sleep was refused.
        assert_eq!(ctl.store().load().unwrap().boot_num, Some(0));
    }

    #[test]
    fn write_failure_still_reaches_sleep() {
        let region = MemoryRegion::new(256).failing_writes();
        let mut ctl = controller(vec![frame(40)], region, WakeCause::ColdBoot);

        ctl.run().unwrap();
        assert_eq!(ctl.power().deep_sleeps(), &[Duration::from_secs(2)]);
        assert_eq!(ctl.store().load_with_status(), LoadStatus::Empty);
    }

    #[test]
    fn corrupt_record_behaves_like_first_run() {
        let region = MemoryRegion::with_contents(256, b"\x00\xffgarbage".to_vec());
        let mut ctl = controller(vec![frame(200)], region, WakeCause::DeepSleepTimer);

        let report = ctl.run_cycle().unwrap();
        assert_eq!(report.decision.unwrap().classification, Classification::Idle);
        assert_eq!(report.persisted.unwrap().boot_num, Some(0));
    }

    #[test]
    fn run_sleeps_after_motion_settles() {
        let frames = vec![frame(130), frame(135)];
        let mut ctl = controller(frames, seeded_region(100.0), WakeCause::ColdBoot);

        ctl.run().unwrap();
        assert_eq!(ctl.state(), CycleState::Sleeping);
        assert_eq!(ctl.power().deep_sleeps(), &[Duration::from_secs(2)]);
        assert_eq!(ctl.streamer().holds().len(), 1);
        assert!(!ctl.flash_led().is_on());
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let board = Board {
            camera: ReplayCamera::new(Vec::new()),
            region: MemoryRegion::new(256),
            processing_led: SimLed::new("processing"),
            flash_led: SimLed::new("flash"),
            power: SimPower::new(WakeCause::ColdBoot),
            streamer: RecordingStreamer::default(),
        };
        let config = DetectorConfig::default().with_motion_threshold(-5.0);
        assert!(matches!(Controller::new(config, board), Err(Error::Config(_))));
    }
}
