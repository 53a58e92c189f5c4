//! System configuration parameters
//!
//! All tunable parameters for the TramRun controller.
//! Values can be overridden via NVS (non-volatile storage); Wi-Fi
//! credentials are seeded at build time from `TRAM_WIFI_SSID` and
//! `TRAM_WIFI_PASS`.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Servo travel limits (degrees).
pub const MIN_ANGLE_DEG: i8 = -90;
pub const MAX_ANGLE_DEG: i8 = 90;

/// Number of 8-pixel text rows on the 128x64 panel.
pub const DISPLAY_ROWS: u8 = 8;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TramConfig {
    // --- Timing ---
    /// Controller polling period (milliseconds)
    pub poll_period_ms: u32,
    /// Button sampling period (milliseconds)
    pub input_poll_period_ms: u32,
    /// Hold time at or above which a press counts as long (milliseconds)
    pub long_press_ms: u32,

    // --- Lifecycle ---
    /// Ticks the Init state counts down before connecting
    pub init_ticks: u8,
    /// Servo angle commanded on entering Init
    pub init_angle_deg: i8,
    /// Servo angle commanded on entering Run
    pub run_angle_deg: i8,

    // --- Display ---
    /// Row used for lifecycle status messages
    pub status_row: u8,
    /// SSD1306 contrast (0-255)
    pub display_contrast: u8,

    // --- Wi-Fi ---
    /// Association attempts before giving up
    pub wifi_max_retries: u8,
    pub wifi_ssid: String<32>,
    pub wifi_password: String<64>,
}

impl Default for TramConfig {
    fn default() -> Self {
        Self {
            // Timing
            poll_period_ms: 1000,      // 1 Hz
            input_poll_period_ms: 200, // 5 Hz
            long_press_ms: 3000,

            // Lifecycle
            init_ticks: 5,
            init_angle_deg: 10,
            run_angle_deg: 70,

            // Display
            status_row: 3,
            display_contrast: 0xFF,

            // Wi-Fi
            wifi_max_retries: 5,
            wifi_ssid: build_time_string(option_env!("TRAM_WIFI_SSID")),
            wifi_password: build_time_string(option_env!("TRAM_WIFI_PASS")),
        }
    }
}

fn build_time_string<const N: usize>(value: Option<&str>) -> String<N> {
    let mut s = String::new();
    if let Some(v) = value {
        if s.push_str(v).is_err() {
            log::warn!("config: build-time value longer than {} bytes ignored", N);
            s.clear();
        }
    }
    s
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl TramConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_period_ms must be > 0"));
        }
        if self.input_poll_period_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "input_poll_period_ms must be > 0",
            ));
        }
        if self.long_press_ms <= self.input_poll_period_ms {
            return Err(ConfigError::ValidationFailed(
                "long_press_ms must exceed input_poll_period_ms",
            ));
        }
        let angles = MIN_ANGLE_DEG..=MAX_ANGLE_DEG;
        if !angles.contains(&self.init_angle_deg) || !angles.contains(&self.run_angle_deg) {
            return Err(ConfigError::ValidationFailed("angles must be -90..=90"));
        }
        if self.status_row >= DISPLAY_ROWS {
            return Err(ConfigError::ValidationFailed("status_row must be 0-7"));
        }
        if self.wifi_max_retries == 0 {
            return Err(ConfigError::ValidationFailed("wifi_max_retries must be > 0"));
        }
        if !is_printable_ascii(&self.wifi_ssid) {
            return Err(ConfigError::ValidationFailed(
                "wifi_ssid must be printable ASCII",
            ));
        }
        let pw_len = self.wifi_password.len();
        if pw_len != 0 && !(8..=64).contains(&pw_len) {
            return Err(ConfigError::ValidationFailed(
                "wifi_password must be empty or 8-64 bytes",
            ));
        }
        Ok(())
    }
}
