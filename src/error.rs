//! Unified error types for the TramRun firmware.
//!
//! Peripheral drivers report a [`DriverError`]; the controller wraps it in
//! an [`Error`] naming the unit that failed to come up.  Every variant is
//! `Copy` so errors can be logged and returned without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fatal setup failure funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The display unit could not be initialised.
    Display(DriverError),
    /// The actuator (servo) unit could not be initialised.
    Actuator(DriverError),
    /// The input monitor could not be initialised.
    Input(DriverError),
    /// The network monitor could not be initialised.
    Network(DriverError),
    /// A unit of execution could not be spawned.
    Spawn(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Spawn(name) => write!(f, "spawn: could not start task '{name}'"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// I2C transaction failed or was not acknowledged.
    Bus,
    /// PWM timer/channel configuration or duty write failed.
    Pwm,
    /// GPIO configuration or read failed.
    Gpio,
    /// Wi-Fi driver call failed with the given ESP-IDF error code.
    Radio(i32),
    /// Non-volatile storage access failed.
    Storage,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::Pwm => write!(f, "PWM error"),
            Self::Gpio => write!(f, "GPIO error"),
            Self::Radio(rc) => write!(f, "Wi-Fi driver error (rc={rc})"),
            Self::Storage => write!(f, "storage error"),
        }
    }
}

impl std::error::Error for DriverError {}

#[cfg(target_os = "espidf")]
impl From<esp_idf_svc::sys::EspError> for DriverError {
    fn from(e: esp_idf_svc::sys::EspError) -> Self {
        Self::Radio(e.code())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
