//! Peripheral units, their drivers, and hardware initialisation.

pub mod button;
pub mod display;
pub mod hw_init;
pub mod oled;
pub mod servo;
pub mod service;
pub mod task_pin;
