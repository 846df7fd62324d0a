// SleepCam - Firmware Entry Point
//
// Wake sequence (every boot, cold or from deep sleep):
//   1. Initialise logging and the camera (grayscale 96x96, PSRAM buffer).
//   2. Claim the LEDs and the RTC memory region.
//   3. Run the power-cycle controller until it requests deep sleep.
//
// Deep sleep never returns: the next timer wake-up starts here again with
// only the RTC region intact.
//
// On a non-ESP target the same binary runs the controller against simulated
// hardware; see `sleepcam --help`.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    simulator::run()
}

// ---------------------------------------------------------------------------
// ESP32-CAM firmware
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
mod firmware {
    use anyhow::Context;
    use esp_idf_hal::gpio::{OutputPin, PinDriver};
    use esp_idf_hal::prelude::*;

    use sleepcam::drivers::camera::EspCamera;
    use sleepcam::drivers::led::Led;
    use sleepcam::drivers::power::EspPower;
    use sleepcam::drivers::rtc::RtcRegion;
    use sleepcam::drivers::stream::HoldStreamer;
    use sleepcam::{Board, Controller, DetectorConfig};

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("SleepCam firmware starting");

        let peripherals = Peripherals::take()?;
        let config = DetectorConfig::default();

        // Camera is initialised once, before the first pass.
        let camera = EspCamera::init(&config)?;

        // GPIO33: red LED, active LOW.  GPIO4: flash LED, active HIGH.
        let processing_led =
            Led::active_low(PinDriver::output(peripherals.pins.gpio33.downgrade_output())?);
        let flash_led =
            Led::active_high(PinDriver::output(peripherals.pins.gpio4.downgrade_output())?);

        let region = RtcRegion::take().context("RTC region already claimed")?;

        let board = Board {
            camera,
            region,
            processing_led,
            flash_led,
            power: EspPower::new(),
            streamer: HoldStreamer,
        };
        let mut controller = Controller::new(config, board)?;

        // Only comes back if the hardware failed.
        controller.run()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host simulator
// ---------------------------------------------------------------------------
#[cfg(not(target_os = "espidf"))]
mod simulator {
    use clap::Parser;

    use sleepcam::cli::Cli;
    use sleepcam::config::RTC_REGION_CAPACITY;
    use sleepcam::drivers::sim::{FileRegion, ReplayCamera, SimLed, SimPower};
    use sleepcam::drivers::stream::HoldStreamer;
    use sleepcam::{Board, Controller, DetectorConfig, WakeCause};

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();

        let cli = Cli::parse();

        let region = FileRegion::new(cli.state, RTC_REGION_CAPACITY);
        // No state file yet means the region was never written: a cold boot.
        let wake = if region.exists() {
            WakeCause::DeepSleepTimer
        } else {
            WakeCause::ColdBoot
        };
        log::info!("SleepCam simulator starting (state {})", region.path().display());

        let board = Board {
            camera: ReplayCamera::from_files(&cli.frames)?,
            region,
            processing_led: SimLed::new("processing"),
            flash_led: SimLed::new("flash"),
            power: SimPower::new(wake).real_time(),
            streamer: HoldStreamer,
        };
        let mut controller = Controller::new(DetectorConfig::default(), board)?;
        controller.run()?;
        Ok(())
    }
}
