// SleepCam - Active Hold
//
// Placeholder streamer: keeps the device awake for the hold interval without
// transmitting anything. A real uplink replaces this behind `Streamer`.

use std::thread;
use std::time::Duration;

use crate::drivers::Streamer;
use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct HoldStreamer;

impl Streamer for HoldStreamer {
    fn stream(&mut self, hold: Duration) -> Result<()> {
        log::info!("Motion hold for {} ms", hold.as_millis());
        thread::sleep(hold);
        Ok(())
    }
}
