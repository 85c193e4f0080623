//! ESP32-CAM (AI-Thinker, OV2640) capture glue.
//!
//! The esp32-camera component comes in through esp-idf-sys's
//! extra_components mechanism; all driver calls go through the generated
//! bindings. Frame-buffer ownership is a guard type so the buffer goes back
//! to the driver on every exit path.

use anyhow::{bail, Result};
use classifier_core::session::{FlashLamp, FrameSource};
use esp_idf_hal::gpio::{Gpio4, Output, PinDriver};

// AI-Thinker pin map. PWDN must be 32 or the sensor never powers up.
const PIN_PWDN: i32 = 32;
const PIN_RESET: i32 = -1;
const PIN_XCLK: i32 = 0;
const PIN_SIOD: i32 = 26;
const PIN_SIOC: i32 = 27;
const PIN_D7: i32 = 35;
const PIN_D6: i32 = 34;
const PIN_D5: i32 = 39;
const PIN_D4: i32 = 36;
const PIN_D3: i32 = 21;
const PIN_D2: i32 = 19;
const PIN_D1: i32 = 18;
const PIN_D0: i32 = 5;
const PIN_VSYNC: i32 = 25;
const PIN_HREF: i32 = 23;
const PIN_PCLK: i32 = 22;

const XCLK_FREQ_HZ: i32 = 20_000_000;
const JPEG_QUALITY: i32 = 12;

pub struct Camera {
    _private: (),
}

impl Camera {
    /// Initializes the camera driver. Failure here is fatal for the device;
    /// the caller halts.
    pub fn init() -> Result<Self> {
        let psram = unsafe { esp_idf_sys::esp_psram_is_initialized() };

        let config = esp_idf_sys::camera_config_t {
            pin_pwdn: PIN_PWDN,
            pin_reset: PIN_RESET,
            pin_xclk: PIN_XCLK,
            __bindgen_anon_1: esp_idf_sys::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: PIN_SIOD,
            },
            __bindgen_anon_2: esp_idf_sys::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: PIN_SIOC,
            },
            pin_d7: PIN_D7,
            pin_d6: PIN_D6,
            pin_d5: PIN_D5,
            pin_d4: PIN_D4,
            pin_d3: PIN_D3,
            pin_d2: PIN_D2,
            pin_d1: PIN_D1,
            pin_d0: PIN_D0,
            pin_vsync: PIN_VSYNC,
            pin_href: PIN_HREF,
            pin_pclk: PIN_PCLK,
            xclk_freq_hz: XCLK_FREQ_HZ,
            ledc_timer: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            ledc_channel: esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
            pixel_format: esp_idf_sys::pixformat_t_PIXFORMAT_JPEG,
            // VGA is plenty for classification; without PSRAM the driver
            // falls back to internal RAM, so keep SVGA there to match the
            // vendor configuration.
            frame_size: if psram {
                esp_idf_sys::framesize_t_FRAMESIZE_VGA
            } else {
                esp_idf_sys::framesize_t_FRAMESIZE_SVGA
            },
            jpeg_quality: JPEG_QUALITY,
            fb_count: 1,
            fb_location: if psram {
                esp_idf_sys::camera_fb_location_t_CAMERA_FB_IN_PSRAM
            } else {
                esp_idf_sys::camera_fb_location_t_CAMERA_FB_IN_DRAM
            },
            grab_mode: esp_idf_sys::camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY,
            ..Default::default()
        };

        let err = unsafe { esp_idf_sys::esp_camera_init(&config) };
        if err != esp_idf_sys::ESP_OK {
            bail!("camera init failed: {err:#x}");
        }

        unsafe { Self::tune_sensor() };
        Ok(Self { _private: () })
    }

    // Classification images come out better with auto white balance,
    // exposure control and lens correction on; values mirror the vendor
    // defaults for the OV2640.
    unsafe fn tune_sensor() {
        let sensor = esp_idf_sys::esp_camera_sensor_get();
        if sensor.is_null() {
            log::warn!("camera sensor handle unavailable, skipping tuning");
            return;
        }
        let s = &*sensor;
        if let Some(set_whitebal) = s.set_whitebal {
            set_whitebal(sensor, 1);
        }
        if let Some(set_awb_gain) = s.set_awb_gain {
            set_awb_gain(sensor, 1);
        }
        if let Some(set_exposure_ctrl) = s.set_exposure_ctrl {
            set_exposure_ctrl(sensor, 1);
        }
        if let Some(set_aec_value) = s.set_aec_value {
            set_aec_value(sensor, 300);
        }
        if let Some(set_raw_gma) = s.set_raw_gma {
            set_raw_gma(sensor, 1);
        }
        if let Some(set_lenc) = s.set_lenc {
            set_lenc(sensor, 1);
        }
        if let Some(set_wpc) = s.set_wpc {
            set_wpc(sensor, 1);
        }
        if let Some(set_dcw) = s.set_dcw {
            set_dcw(sensor, 1);
        }
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        unsafe {
            esp_idf_sys::esp_camera_deinit();
        }
    }
}

/// One captured JPEG frame. The driver's buffer is returned exactly once,
/// when this guard drops.
pub struct CameraFrame {
    fb: *mut esp_idf_sys::camera_fb_t,
}

impl AsRef<[u8]> for CameraFrame {
    fn as_ref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts((*self.fb).buf, (*self.fb).len) }
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        unsafe { esp_idf_sys::esp_camera_fb_return(self.fb) };
    }
}

impl FrameSource for Camera {
    type Frame = CameraFrame;

    fn acquire_frame(&mut self) -> Option<CameraFrame> {
        let fb = unsafe { esp_idf_sys::esp_camera_fb_get() };
        (!fb.is_null()).then(|| CameraFrame { fb })
    }
}

/// The on-board flash LED (GPIO 4), held low outside capture windows.
pub struct FlashLed<'d> {
    pin: PinDriver<'d, Gpio4, Output>,
}

impl<'d> FlashLed<'d> {
    pub fn new(gpio4: Gpio4) -> Result<Self> {
        let mut pin = PinDriver::output(gpio4)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl FlashLamp for FlashLed<'_> {
    fn set_lit(&mut self, lit: bool) {
        let result = if lit {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            log::warn!("flash LED write failed: {e}");
        }
    }
}
