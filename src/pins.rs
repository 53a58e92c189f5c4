//! GPIO / peripheral pin assignments for the TramRun board.
//!
//! Single source of truth: `drivers::hw_init` builds every peripheral
//! from these numbers rather than hard-coding pins.

// ---------------------------------------------------------------------------
// SSD1306 OLED (I2C0)
// ---------------------------------------------------------------------------

pub const DISPLAY_SDA_GPIO: i32 = 21;
pub const DISPLAY_SCL_GPIO: i32 = 22;
/// 7-bit I2C address of the SSD1306 controller.
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;
pub const DISPLAY_I2C_BAUD_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Servo (LEDC PWM)
// ---------------------------------------------------------------------------

/// Servo pulse output.
pub const SERVO_PULSE_GPIO: i32 = 18;
/// Standard hobby-servo frame rate (20 ms period).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;

// ---------------------------------------------------------------------------
// User button (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// BOOT button on most ESP32 dev boards.
pub const BUTTON_GPIO: i32 = 0;
