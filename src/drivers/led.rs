// SleepCam - Indicator LEDs
//
// GPIO-driven LEDs. The ESP32-CAM's red LED is wired active LOW, the flash
// LED active HIGH, so polarity is fixed per instance.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use crate::drivers::Indicator;

pub struct Led<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
    active_low: bool,
}

impl<'d> Led<'d> {
    pub fn active_high(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self::new(pin, false)
    }

    pub fn active_low(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self::new(pin, true)
    }

    fn new(pin: PinDriver<'d, AnyOutputPin, Output>, active_low: bool) -> Self {
        let mut led = Self { pin, active_low };
        led.set_off();
        led
    }

    fn drive(&mut self, on: bool) {
        // Indicators are observational; a failed GPIO write is not worth a cycle.
        let result = if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            log::warn!("LED write failed: {}", e);
        }
    }
}

impl Indicator for Led<'_> {
    fn set_on(&mut self) {
        self.drive(true);
    }

    fn set_off(&mut self) {
        self.drive(false);
    }
}
