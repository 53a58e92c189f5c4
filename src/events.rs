//! Controller event queue.
//!
//! Events are produced by:
//! - the input monitor (button press / long press callbacks)
//! - the network monitor (association outcome callback)
//! - the controller itself (synthetic `Tick` when a period was quiet)
//!
//! Events are consumed by the controller loop, one at a time, in
//! submission order.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Input mon.   │────▶│  EventQueue  │────▶│  Controller  │
//! │ Network mon. │────▶│  (bounded 5) │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The queue never drops: a producer that finds it full is suspended
//! until the controller drains it.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future::block_on;

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 5;

/// Pure signalling events; none carries a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Event {
    /// Button released before the long-press threshold.
    ButtonPress = 0,
    /// Button held at least the long-press threshold.
    ButtonLongPress = 1,
    /// Network association completed with an address.
    NetworkReady = 2,
    /// Network association abandoned after the retry bound.
    NetworkFailed = 3,
    /// Synthetic forward-progress stimulus from the controller loop.
    Tick = 4,
}

impl Event {
    pub const ALL: [Event; 5] = [
        Event::ButtonPress,
        Event::ButtonLongPress,
        Event::NetworkReady,
        Event::NetworkFailed,
        Event::Tick,
    ];
}

type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH>;

/// The controller's bounded FIFO.  Owned by the controller; producers
/// get an [`EventSender`].
pub struct EventQueue {
    channel: Arc<EventChannel>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
        }
    }

    /// Producer handle for callbacks and peripheral units.
    pub fn sender(&self) -> EventSender {
        EventSender {
            channel: Arc::clone(&self.channel),
        }
    }

    /// Pop the next event without waiting.
    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Drain every event currently queued into `handler`, in FIFO order.
    /// Returns how many were handled.
    pub fn drain(&self, mut handler: impl FnMut(Event)) -> usize {
        let mut count = 0;
        while let Some(event) = self.pop() {
            handler(event);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Cloneable producer side of the [`EventQueue`].
#[derive(Clone)]
pub struct EventSender {
    channel: Arc<EventChannel>,
}

impl EventSender {
    /// Enqueue `event`, suspending the caller while the queue is full.
    pub fn post(&self, event: Event) {
        block_on(self.channel.send(event));
    }

    /// Enqueue without waiting.  Returns `false` if the queue is full.
    pub fn try_post(&self, event: Event) -> bool {
        self.channel.try_send(event).is_ok()
    }
}
