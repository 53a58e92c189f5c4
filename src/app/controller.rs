//! The controller: lifecycle FSM plus its polling loop.
//!
//! [`Controller`] owns the FSM, the shared context and the event queue.
//! [`start`] brings every peripheral unit up, wires the monitors'
//! callbacks into the queue and launches the loop on its own task.
//!
//! ```text
//!  InputMonitor ──┐                         ┌──▶ DisplayService
//!                 ├──▶ EventQueue ──▶ Controller ──▶ ActuatorService
//!  NetworkMonitor ┘        (5)        (FSM)  └──▶ NetworkMonitor (start)
//! ```
//!
//! Every period the loop drains the queue in FIFO order; a period that
//! found the queue empty dispatches one synthetic `Tick` instead.

use std::thread::JoinHandle;

use embassy_time::{Duration, Ticker};
use embedded_hal::digital::InputPin;
use futures_lite::future::block_on;
use log::info;

use crate::adapters::wifi::{NetworkControl, NetworkMonitor, NetworkState};
use crate::config::TramConfig;
use crate::drivers::button::InputMonitor;
use crate::drivers::display::{DisplayQueue, DisplayService};
use crate::drivers::servo::{ActuatorQueue, ActuatorService};
use crate::drivers::task_pin::{self, CONTROLLER_TASK};
use crate::error::{Error, Result};
use crate::events::{Event, EventQueue, EventSender};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{DispatchResult, Fsm, LifecycleState};

use super::events::ControllerEvent;
use super::ports::{Actuator, ConfigError, EventSink, TextDisplay, WifiStation};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller {
    fsm: Fsm,
    ctx: FsmContext,
    events: EventQueue,
}

impl Controller {
    /// Build the controller around already running peripheral units.
    /// The FSM is not entered until [`enter_initial_state`](Self::enter_initial_state).
    pub fn new(
        config: TramConfig,
        events: EventQueue,
        display: DisplayQueue,
        actuator: ActuatorQueue,
        network: NetworkControl,
    ) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), LifecycleState::Init),
            ctx: FsmContext::new(config, display, actuator, network),
            events,
        }
    }

    /// Run the initial state's `Enter` action.
    pub fn enter_initial_state(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&ControllerEvent::Started(self.fsm.current_state()));
    }

    /// One loop period: dispatch every queued event in arrival order, or
    /// a single `Tick` if there were none.  Returns the number of queued
    /// events handled.
    pub fn poll_once(&mut self, sink: &mut impl EventSink) -> usize {
        let Self { fsm, ctx, events } = self;
        let drained = events.drain(|event| {
            dispatch_and_report(fsm, ctx, event, sink);
        });
        if drained == 0 {
            dispatch_and_report(fsm, ctx, Event::Tick, sink);
        }
        drained
    }

    /// Dispatch a single event immediately, bypassing the queue.
    pub fn dispatch(&mut self, event: Event, sink: &mut impl EventSink) -> DispatchResult {
        dispatch_and_report(&mut self.fsm, &mut self.ctx, event, sink)
    }

    pub fn current_state(&self) -> LifecycleState {
        self.fsm.current_state()
    }

    pub fn context(&self) -> &FsmContext {
        &self.ctx
    }

    /// Producer handle onto this controller's queue.
    pub fn sender(&self) -> EventSender {
        self.events.sender()
    }

    /// The polling loop.  Never returns.
    pub fn run(mut self, mut sink: impl EventSink) -> ! {
        self.enter_initial_state(&mut sink);
        let period = Duration::from_millis(u64::from(self.ctx.config.poll_period_ms));
        let mut ticker = Ticker::every(period);
        loop {
            // Deadlines advance by `period` from the previous deadline, so
            // handler time does not accumulate as drift.
            block_on(ticker.next());
            self.poll_once(&mut sink);
        }
    }
}

fn dispatch_and_report(
    fsm: &mut Fsm,
    ctx: &mut FsmContext,
    event: Event,
    sink: &mut impl EventSink,
) -> DispatchResult {
    let state = fsm.current_state();
    let result = fsm.dispatch_and_transit(event, ctx);
    sink.emit(&ControllerEvent::Dispatched {
        state,
        event,
        result,
    });
    let now = fsm.current_state();
    if now != state {
        sink.emit(&ControllerEvent::StateChanged {
            from: state,
            to: now,
        });
    }
    result
}

// ───────────────────────────────────────────────────────────────
// Start-up
// ───────────────────────────────────────────────────────────────

/// Everything the controller needs from the board, each piece handed
/// to exactly one peripheral unit.
pub struct Board<D, A, L, W> {
    pub display: D,
    pub actuator: A,
    pub button: L,
    pub station: W,
}

/// Keeps the peripheral units alive for the life of the loop.
pub struct ControllerHandle {
    events: EventSender,
    task: JoinHandle<()>,
    // Held only to keep the units running.
    _display: DisplayService,
    _actuator: ActuatorService,
    _input: InputMonitor,
    _network: NetworkMonitor,
}

impl ControllerHandle {
    /// Producer handle onto the controller's queue.
    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    /// `true` once the loop task has ended.  The loop never returns, so
    /// only a panic in a handler gets here.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Bring up every peripheral unit, then launch the polling loop.
///
/// Returns as soon as the loop task is running.  Any unit failing to
/// initialise fails the whole start; the caller treats that as fatal.
pub fn start<D, A, L, W, S>(config: TramConfig, board: Board<D, A, L, W>, sink: S) -> Result<ControllerHandle>
where
    D: TextDisplay + Send + 'static,
    A: Actuator + Send + 'static,
    L: InputPin + Send + 'static,
    W: WifiStation + Send + 'static,
    S: EventSink + Send + 'static,
{
    config.validate().map_err(|e| match e {
        ConfigError::ValidationFailed(msg) => Error::Config(msg),
        _ => Error::Config("unusable configuration"),
    })?;

    // The monitors' callbacks need a sender, so the queue comes first.
    let events = EventQueue::new();

    let display = DisplayService::init(board.display)?;
    let actuator = ActuatorService::init(board.actuator)?;

    let on_press = events.sender();
    let on_long_press = events.sender();
    let input = InputMonitor::init(
        board.button,
        move || on_press.post(Event::ButtonPress),
        move || on_long_press.post(Event::ButtonLongPress),
        &config,
    )?;

    let on_network = events.sender();
    let network = NetworkMonitor::init(
        board.station,
        move |state| {
            on_network.post(match state {
                NetworkState::Ready => Event::NetworkReady,
                NetworkState::NotAbleToConnect => Event::NetworkFailed,
            })
        },
        &config,
    )?;

    let sender = events.sender();
    let controller = Controller::new(config, events, display.queue(), actuator.queue(), network.control());
    let task = task_pin::spawn_on_core(CONTROLLER_TASK, move || {
        controller.run(sink);
    })?;
    info!("CTRL: started");

    Ok(ControllerHandle {
        events: sender,
        task,
        _display: display,
        _actuator: actuator,
        _input: input,
        _network: network,
    })
}
