//! Actuator Service: hobby servo on an LEDC PWM channel.
//!
//! ## Hardware
//!
//! Standard 50 Hz positional servo.  A 500 µs pulse is full left
//! (-90°), 2500 µs full right (+90°), 1500 µs centre.
//!
//! ```text
//!  pulse_us = 500 + (angle + 90) * 2000 / 180
//!  duty     = pulse_us / 20_000  (fraction of the 20 ms frame)
//! ```
//!
//! Angles outside the travel are clamped here, at the driver boundary.

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::{debug, info, warn};

use super::service::{CommandQueue, PeripheralService};
use super::task_pin::SERVO_TASK;
use crate::app::ports::Actuator;
use crate::config::{MAX_ANGLE_DEG, MIN_ANGLE_DEG};
use crate::error::{DriverError, Error, Result};

/// Actuator queue depth.
pub const ACTUATOR_QUEUE_DEPTH: usize = 4;

pub type ActuatorQueue = CommandQueue<ActuatorCommand, ACTUATOR_QUEUE_DEPTH>;

/// One 50 Hz frame, in microseconds.
pub const FRAME_US: u16 = 20_000;
const MIN_PULSE_US: i32 = 500;
const MAX_PULSE_US: i32 = 2500;

/// Commands accepted by the actuator task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Move the horn to the given angle in degrees.
    RotateTo(i8),
}

/// Pulse width for `angle_deg`, after clamping to the servo's travel.
pub fn pulse_width_us(angle_deg: i8) -> u16 {
    let angle = i32::from(angle_deg.clamp(MIN_ANGLE_DEG, MAX_ANGLE_DEG));
    let span = i32::from(MAX_ANGLE_DEG) - i32::from(MIN_ANGLE_DEG);
    let pulse = MIN_PULSE_US + (angle - i32::from(MIN_ANGLE_DEG)) * (MAX_PULSE_US - MIN_PULSE_US) / span;
    pulse as u16
}

/// Servo on any PWM channel already running at 50 Hz.
pub struct Servo<P> {
    pwm: P,
    angle_deg: i8,
}

impl<P: SetDutyCycle> Servo<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, angle_deg: 0 }
    }

    /// Last angle written to the output.
    pub fn angle(&self) -> i8 {
        self.angle_deg
    }

    fn write_pulse(&mut self, pulse_us: u16) -> core::result::Result<(), DriverError> {
        self.pwm
            .set_duty_cycle_fraction(pulse_us, FRAME_US)
            .map_err(|e| {
                warn!("SERVO: duty write failed ({:?})", e.kind());
                DriverError::Pwm
            })
    }
}

impl<P: SetDutyCycle> Actuator for Servo<P> {
    fn init(&mut self) -> core::result::Result<(), DriverError> {
        self.write_pulse(pulse_width_us(0))?;
        self.angle_deg = 0;
        info!("SERVO: centred");
        Ok(())
    }

    fn rotate(&mut self, angle_deg: i8) -> core::result::Result<(), DriverError> {
        let clamped = angle_deg.clamp(MIN_ANGLE_DEG, MAX_ANGLE_DEG);
        if clamped != angle_deg {
            warn!("SERVO: angle {} clamped to {}", angle_deg, clamped);
        }
        let pulse = pulse_width_us(clamped);
        debug!("SERVO: rotate to {}° ({} us)", clamped, pulse);
        self.write_pulse(pulse)?;
        self.angle_deg = clamped;
        Ok(())
    }
}

/// Execute one command.  Errors are logged, never fatal.
pub fn apply<A: Actuator>(actuator: &mut A, cmd: ActuatorCommand) {
    match cmd {
        ActuatorCommand::RotateTo(angle) => {
            info!("SERVO: rotate to {}", angle);
            if let Err(e) = actuator.rotate(angle) {
                warn!("SERVO: rotate failed: {}", e);
            }
        }
    }
}

/// Handle to the running actuator task.
pub struct ActuatorService {
    service: PeripheralService<ActuatorCommand, ACTUATOR_QUEUE_DEPTH>,
}

impl ActuatorService {
    /// Initialise the actuator and hand it to a dedicated task.
    pub fn init<A: Actuator + Send + 'static>(mut actuator: A) -> Result<Self> {
        actuator.init().map_err(Error::Actuator)?;
        let service = PeripheralService::spawn(SERVO_TASK, move |cmd| apply(&mut actuator, cmd))?;
        Ok(Self { service })
    }

    /// Queue a command; blocks while the queue is full.
    pub fn send_event(&self, cmd: ActuatorCommand) {
        self.service.send(cmd);
    }

    pub fn queue(&self) -> ActuatorQueue {
        self.service.queue()
    }

    pub fn deinit(self) {
        info!("SERVO: deinit");
        self.service.shutdown();
    }
}
