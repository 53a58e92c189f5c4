//! One-shot hardware peripheral initialization.
//!
//! Builds the concrete board peripherals (I2C display bus, LEDC servo
//! channel, button input, Wi-Fi radio) from the pin map in
//! [`crate::pins`].  Called once from `main()`; each result is then
//! handed to exactly one peripheral unit.

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    gpio::{AnyIOPin, AnyOutputPin, Input, PinDriver, Pull},
    i2c::{I2cConfig, I2cDriver},
    ledc::{LedcDriver, LedcTimerDriver, Resolution, config::TimerConfig},
    peripherals::Peripherals,
    units::Hertz,
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition, wifi::EspWifi};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    I2cInitFailed(i32),
    LedcInitFailed(i32),
    GpioConfigFailed(i32),
    WifiInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2cInitFailed(rc)    => write!(f, "I2C master init failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::WifiInitFailed(rc)   => write!(f, "Wi-Fi driver init failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── Board ─────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub type BoardDisplay = super::oled::TextPanel<super::oled::Oled<I2cDriver<'static>>>;
#[cfg(target_os = "espidf")]
pub type BoardServo = super::servo::Servo<LedcDriver<'static>>;
#[cfg(target_os = "espidf")]
pub type BoardButton = PinDriver<'static, AnyIOPin, Input>;
#[cfg(target_os = "espidf")]
pub type TramBoard =
    crate::app::controller::Board<BoardDisplay, BoardServo, BoardButton, crate::adapters::wifi::EspStation>;

/// Construct every board peripheral.  Nothing is started yet.
#[cfg(target_os = "espidf")]
pub fn init_board(
    peripherals: Peripherals,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    config: &crate::config::TramConfig,
) -> Result<TramBoard, HwInitError> {
    use crate::pins::*;

    // SAFETY: the pin numbers in `pins` are distinct and not claimed
    // through `peripherals.pins` anywhere else.
    let (sda, scl, pulse, button) = unsafe {
        (
            AnyIOPin::new(DISPLAY_SDA_GPIO),
            AnyIOPin::new(DISPLAY_SCL_GPIO),
            AnyOutputPin::new(SERVO_PULSE_GPIO),
            AnyIOPin::new(BUTTON_GPIO),
        )
    };

    // ── SSD1306 on I2C0 ──
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(DISPLAY_I2C_BAUD_HZ));
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_cfg)
        .map_err(|e| HwInitError::I2cInitFailed(e.code()))?;
    let display = super::oled::TextPanel::new(super::oled::oled(i2c, DISPLAY_I2C_ADDR), config.display_contrast);

    // ── Servo on LEDC timer 0 / channel 0 ──
    let timer_cfg = TimerConfig::default()
        .frequency(Hertz(SERVO_PWM_FREQ_HZ))
        .resolution(Resolution::Bits14);
    let timer = LedcTimerDriver::new(peripherals.ledc.timer0, &timer_cfg)
        .map_err(|e| HwInitError::LedcInitFailed(e.code()))?;
    let channel = LedcDriver::new(peripherals.ledc.channel0, timer, pulse)
        .map_err(|e| HwInitError::LedcInitFailed(e.code()))?;
    let servo = super::servo::Servo::new(channel);

    // ── Button: active-low with internal pull-up ──
    let mut button = PinDriver::input(button).map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;
    button
        .set_pull(Pull::Up)
        .map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;

    // ── Wi-Fi station ──
    let wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))
        .map_err(|e| HwInitError::WifiInitFailed(e.code()))?;
    let station = crate::adapters::wifi::EspStation::new(wifi, sysloop);

    log::info!("HW: board peripherals constructed");
    Ok(crate::app::controller::Board {
        display,
        actuator: servo,
        button,
        station,
    })
}
