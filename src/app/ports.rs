//! Port traits: the boundary between the controller and the hardware.
//!
//! ```text
//!   Driver ──▶ Port trait ──▶ peripheral unit ◀── Controller (commands)
//! ```
//!
//! Each peripheral unit is generic over its port, so the units and the
//! controller run unchanged against the ESP-IDF drivers on the device
//! and against recording mocks on the host.

use std::sync::Arc;

use crate::config::TramConfig;
use crate::error::DriverError;

// ───────────────────────────────────────────────────────────────
// Display port (driven by the display unit)
// ───────────────────────────────────────────────────────────────

/// A row-addressed text panel.
pub trait TextDisplay {
    /// Bring the panel up and blank it.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Blank every row.
    fn clear(&mut self) -> Result<(), DriverError>;

    /// Render exactly `text.len()` character cells from column 0 of `row`.
    fn draw_text(&mut self, row: u8, text: &[u8]) -> Result<(), DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven by the actuator unit)
// ───────────────────────────────────────────────────────────────

/// A positional actuator.
pub trait Actuator {
    /// Configure the output and move to the neutral position.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Move to `angle_deg`; implementations clamp to their travel.
    fn rotate(&mut self, angle_deg: i8) -> Result<(), DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi station port (driven by the network monitor)
// ───────────────────────────────────────────────────────────────

/// Notifications raised by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    /// Station mode is up; association may begin.
    Started,
    /// Associated with the access point (no address yet).
    Connected,
    /// Association lost or attempt failed.
    Disconnected,
    /// DHCP address acquired.
    GotIp,
    /// Station mode stopped.
    Stopped,
}

/// Callback the station invokes from the network stack's own context.
pub type StationNotifier = Arc<dyn Fn(StationEvent) + Send + Sync>;

/// A Wi-Fi radio in station mode.
pub trait WifiStation {
    /// Apply credentials and route stack notifications to `notify`.
    fn init(&mut self, config: &TramConfig, notify: StationNotifier) -> Result<(), DriverError>;

    /// Enter station mode; the stack answers with [`StationEvent::Started`].
    fn start(&mut self) -> Result<(), DriverError>;

    /// Begin one association attempt.
    fn connect(&mut self) -> Result<(), DriverError>;

    /// Leave station mode.
    fn stop(&mut self) -> Result<(), DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (controller → logging / observers)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured
/// [`ControllerEvent`](super::events::ControllerEvent)s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<TramConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &TramConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
