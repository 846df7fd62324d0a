// SleepCam - OV2640 Camera Driver
//
// Thin wrapper over the `espressif/esp32-camera` component (bound through
// esp-idf-sys extra components). Grayscale only, one frame buffer in PSRAM.

use esp_idf_sys::camera;

use crate::config::*;
use crate::drivers::{Camera, Frame};
use crate::error::{Error, Result};

pub struct EspCamera {
    frame_len: usize,
}

impl EspCamera {
    /// Initialise the sensor once per process, before the first capture.
    pub fn init(config: &DetectorConfig) -> Result<Self> {
        let frame_size = match (config.frame_width, config.frame_height) {
            (96, 96) => camera::framesize_t_FRAMESIZE_96X96,
            (160, 120) => camera::framesize_t_FRAMESIZE_QQVGA,
            (w, h) => {
                return Err(Error::Config(format!("sensor has no {w}x{h} frame size")));
            }
        };

        let cam_config = camera::camera_config_t {
            pin_pwdn: CAM_PIN_PWDN,
            pin_reset: CAM_PIN_RESET,
            pin_xclk: CAM_PIN_XCLK,
            __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: CAM_PIN_SIOD,
            },
            __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: CAM_PIN_SIOC,
            },
            pin_d7: CAM_PIN_D7,
            pin_d6: CAM_PIN_D6,
            pin_d5: CAM_PIN_D5,
            pin_d4: CAM_PIN_D4,
            pin_d3: CAM_PIN_D3,
            pin_d2: CAM_PIN_D2,
            pin_d1: CAM_PIN_D1,
            pin_d0: CAM_PIN_D0,
            pin_vsync: CAM_PIN_VSYNC,
            pin_href: CAM_PIN_HREF,
            pin_pclk: CAM_PIN_PCLK,
            xclk_freq_hz: CAM_XCLK_FREQ_HZ,
            ledc_timer: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            ledc_channel: esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
            pixel_format: camera::pixformat_t_PIXFORMAT_GRAYSCALE,
            frame_size,
            jpeg_quality: 12, // Unused for grayscale
            fb_count: 1,
            fb_location: camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
            grab_mode: camera::camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY,
            ..Default::default()
        };

        esp_idf_sys::esp!(unsafe { camera::esp_camera_init(&cam_config) })
            .map_err(|e| Error::HardwareIo(format!("camera init failed: {e}")))?;

        log::info!(
            "Camera initialised ({}x{} grayscale, PSRAM frame buffer)",
            config.frame_width,
            config.frame_height
        );
        Ok(Self {
            frame_len: config.frame_len(),
        })
    }
}

impl Camera for EspCamera {
    fn capture(&mut self) -> Result<Frame> {
        let fb = unsafe { camera::esp_camera_fb_get() };
        if fb.is_null() {
            return Err(Error::HardwareIo("camera returned no frame buffer".into()));
        }

        // SAFETY: `fb` is non-null and owned by us until `esp_camera_fb_return`.
        let pixels = unsafe { std::slice::from_raw_parts((*fb).buf, (*fb).len) }.to_vec();
        unsafe { camera::esp_camera_fb_return(fb) };

        if pixels.len() != self.frame_len {
            log::warn!(
                "Frame buffer holds {} bytes, expected {}",
                pixels.len(),
                self.frame_len
            );
        }
        Ok(Frame::new(pixels))
    }
}
