//! Outbound controller events.
//!
//! The [`Controller`](super::controller::Controller) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them.

use crate::events::Event;
use crate::fsm::{DispatchResult, LifecycleState};

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The polling loop started and entered its initial state.
    Started(LifecycleState),

    /// An event was dispatched in `state` and produced `result`.
    Dispatched {
        state: LifecycleState,
        event: Event,
        result: DispatchResult,
    },

    /// A transition completed (exit of `from`, enter of `to`).
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
}
