//! Input Monitor: polled push button with press / long-press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The line is sampled at a
//! fixed period (200 ms by default); sampling that slowly is itself the
//! debounce, contact bounce settles well inside one period.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                       | Callback        |
//! |-------------|---------------------------------|-----------------|
//! | Press       | Released after < 3 s            | `on_press`      |
//! | Long press  | Released after >= 3 s           | `on_long_press` |
//!
//! The press start is recorded on the falling edge and the hold time is
//! measured on the rising edge, so exactly one callback fires per
//! press-and-release cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use embassy_time::{Duration, Instant, Ticker};
use embedded_hal::digital::{Error as _, InputPin};
use futures_lite::future::block_on;
use log::{debug, info, warn};

use super::task_pin::{self, INPUT_TASK};
use crate::config::TramConfig;
use crate::error::{DriverError, Error, Result};

/// Classified button gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Released,
    Pressed { since_ms: u64 },
}

/// Edge tracker fed one sample per poll period.
#[derive(Debug, Clone)]
pub struct PressDetector {
    long_press_ms: u64,
    state: GestureState,
}

impl PressDetector {
    pub fn new(long_press_ms: u32) -> Self {
        Self {
            long_press_ms: u64::from(long_press_ms),
            state: GestureState::Released,
        }
    }

    /// Feed one sample.  `pressed` is the logical level (already inverted
    /// for the active-low line); `now_ms` is monotonic time.
    pub fn sample(&mut self, pressed: bool, now_ms: u64) -> Option<ButtonEvent> {
        match (self.state, pressed) {
            (GestureState::Released, true) => {
                self.state = GestureState::Pressed { since_ms: now_ms };
                None
            }
            (GestureState::Pressed { since_ms }, false) => {
                self.state = GestureState::Released;
                let held_ms = now_ms.saturating_sub(since_ms);
                debug!("INPUT: released after {} ms", held_ms);
                if held_ms >= self.long_press_ms {
                    Some(ButtonEvent::LongPress)
                } else {
                    Some(ButtonEvent::Press)
                }
            }
            _ => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, GestureState::Pressed { .. })
    }
}

/// Handle to the running input polling task.
pub struct InputMonitor {
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl InputMonitor {
    /// Take ownership of `line` and start polling it.
    ///
    /// The callbacks run on the input task and must not block for long;
    /// they are expected to enqueue an event and return.
    pub fn init<L, P, LP>(mut line: L, on_press: P, on_long_press: LP, config: &TramConfig) -> Result<Self>
    where
        L: InputPin + Send + 'static,
        P: Fn() + Send + 'static,
        LP: Fn() + Send + 'static,
    {
        // Fail at init, not on the first poll, if the line is unreadable.
        line.is_low().map_err(|e| {
            warn!("INPUT: line read failed ({:?})", e.kind());
            Error::Input(DriverError::Gpio)
        })?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let period = Duration::from_millis(u64::from(config.input_poll_period_ms));
        let mut detector = PressDetector::new(config.long_press_ms);

        let task = task_pin::spawn_on_core(INPUT_TASK, move || {
            let mut ticker = Ticker::every(period);
            while !stop_flag.load(Ordering::Acquire) {
                match line.is_low() {
                    Ok(pressed) => match detector.sample(pressed, Instant::now().as_millis()) {
                        Some(ButtonEvent::Press) => {
                            info!("INPUT: press");
                            on_press();
                        }
                        Some(ButtonEvent::LongPress) => {
                            info!("INPUT: long press");
                            on_long_press();
                        }
                        None => {}
                    },
                    Err(e) => warn!("INPUT: line read failed ({:?})", e.kind()),
                }
                block_on(ticker.next());
            }
            info!("INPUT: task stopped");
        })?;

        info!(
            "INPUT: polling every {} ms, long press >= {} ms",
            config.input_poll_period_ms, config.long_press_ms
        );
        Ok(Self {
            stop,
            task: Some(task),
        })
    }

    /// Stop polling.  Returns after the task has exited.
    pub fn deinit(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            if task.join().is_err() {
                warn!("INPUT: task panicked");
            }
        }
    }
}
