//! Application core: the controller and its boundary.
//!
//! The controller owns the lifecycle FSM and the event queue.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`] and the peripheral units' command queues, keeping this
//! layer testable without real peripherals.

pub mod controller;
pub mod events;
pub mod ports;
