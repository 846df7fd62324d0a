// SleepCam - Power Management
//
// Timer-woken deep sleep. Everything except RTC memory is lost; the next wake
// boots the firmware from `main` again.

use std::thread;
use std::time::Duration;

use crate::drivers::Power;
use crate::error::{Error, Result};
use crate::events::WakeCause;

#[derive(Debug, Default)]
pub struct EspPower;

impl EspPower {
    pub fn new() -> Self {
        Self
    }
}

impl Power for EspPower {
    fn wake_cause(&self) -> WakeCause {
        let cause = unsafe { esp_idf_sys::esp_sleep_get_wakeup_cause() };
        if cause == esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
            WakeCause::DeepSleepTimer
        } else {
            WakeCause::ColdBoot
        }
    }

    fn delay(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    /// Arm the RTC timer and power down. Only returns if arming failed.
    fn enter_deep_sleep(&mut self, interval: Duration) -> Result<()> {
        let micros = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        esp_idf_sys::esp!(unsafe { esp_idf_sys::esp_sleep_enable_timer_wakeup(micros) })
            .map_err(|e| {
                Error::HardwareIo(format!("timer wake-up for {micros} us rejected: {e}"))
            })?;

        log::debug!("Timer wake-up armed for {} us", micros);
        unsafe {
            esp_idf_sys::esp_deep_sleep_start();
        }
    }
}
