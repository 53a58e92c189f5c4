//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events to the ESP-IDF
//! logger (UART / USB-CDC in production).

use log::{debug, info};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;
use crate::events::Event;
use crate::fsm::DispatchResult;

/// Adapter that logs every [`ControllerEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Started(state) => {
                info!("CTRL: loop started in {:?}", state);
            }
            ControllerEvent::Dispatched {
                state,
                event,
                result: DispatchResult::Ignored,
            }
            | ControllerEvent::Dispatched {
                state,
                event: event @ Event::Tick,
                result: DispatchResult::Handled,
            } => {
                debug!("CTRL: {:?} in {:?}", event, state);
            }
            ControllerEvent::Dispatched {
                state,
                event,
                result,
            } => {
                info!("CTRL: {:?} in {:?} -> {:?}", event, state, result);
            }
            ControllerEvent::StateChanged { from, to } => {
                info!("CTRL: state {:?} -> {:?}", from, to);
            }
        }
    }
}
