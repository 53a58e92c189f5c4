//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────────────────┬──────────────────┬────────────────┐ │
//! │  │ LifecycleState      │ on_transit       │ on_event       │ │
//! │  ├─────────────────────┼──────────────────┼────────────────┤ │
//! │  │ Init                │ fn(ctx, Phase)   │ fn(ctx, Event) │ │
//! │  │ ConnectingToNetwork │ fn(ctx, Phase)   │ fn(ctx, Event) │ │
//! │  │ Run                 │ fn(ctx, Phase)   │ fn(ctx, Event) │ │
//! │  └─────────────────────┴──────────────────┴────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every event goes to `on_event` of the **current** state.  If that
//! returns [`DispatchResult::TransitRequested`], the engine runs
//! `on_transit(Exit)` for the current state, moves the pointer, then
//! runs `on_transit(Enter)` for the next one.  Each handler matches
//! exhaustively on [`Event`], so the state × event matrix is total.

pub mod context;
pub mod states;

use context::FsmContext;
use log::{error, info};

use crate::events::Event;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all lifecycle states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    Init = 0,
    ConnectingToNetwork = 1,
    Run = 2,
}

impl LifecycleState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 3;

    pub const ALL: [LifecycleState; Self::COUNT] = [
        LifecycleState::Init,
        LifecycleState::ConnectingToNetwork,
        LifecycleState::Run,
    ];

}

/// Which side of a transition a state handler is being called for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Exit,
}

/// Outcome of dispatching one event to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// The state has no use for the event.
    Ignored,
    /// The state consumed the event and stays.
    Handled,
    /// The state asks to move to another state.  Never the current one.
    TransitRequested(LifecycleState),
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Entry/exit action.  Runs exactly once per side of each transition.
pub type StateTransitFn = fn(&mut FsmContext, Phase);

/// Per-event handler.
pub type StateEventFn = fn(&mut FsmContext, Event) -> DispatchResult;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single lifecycle state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: LifecycleState,
    pub name: &'static str,
    pub on_transit: StateTransitFn,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The lifecycle state machine.
///
/// Owns the state table and the index of the current state.  The
/// current state only changes inside [`Fsm::dispatch_and_transit`].
pub struct Fsm {
    /// Fixed-size table indexed by `LifecycleState as usize`.
    table: [StateDescriptor; LifecycleState::COUNT],
    /// Index of the currently active state.
    current: usize,
    started: bool,
    /// Completed transitions since start.
    transitions: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; LifecycleState::COUNT], initial: LifecycleState) -> Self {
        for (idx, row) in table.iter().enumerate() {
            debug_assert_eq!(row.id as usize, idx, "state table row {idx} out of order");
        }
        Self {
            table,
            current: initial as usize,
            started: false,
            transitions: 0,
        }
    }

    /// Run the `Enter` action of the initial state.
    /// Call once, before the first dispatch.  Later calls are no-ops.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        if self.started {
            return;
        }
        self.started = true;
        info!("CTRL: starting in state {}", self.table[self.current].name);
        (self.table[self.current].on_transit)(ctx, Phase::Enter);
    }

    /// Dispatch one event to the current state and perform any requested
    /// transition.
    ///
    /// A handler requesting a transition to the state it is already in
    /// breaks the table contract.  That is logged and the whole process
    /// aborts, the same as a failed start-up; no unit outlives it.
    pub fn dispatch_and_transit(&mut self, event: Event, ctx: &mut FsmContext) -> DispatchResult {
        let result = (self.table[self.current].on_event)(ctx, event);

        if let DispatchResult::TransitRequested(next) = result {
            if next as usize == self.current {
                error!(
                    "CTRL: state {} requested a self-transition on {:?}",
                    self.table[self.current].name, event
                );
                std::process::abort();
            }
            self.transition(next, ctx);
        }

        result
    }

    /// The current state's identity.
    pub fn current_state(&self) -> LifecycleState {
        self.table[self.current].id
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: LifecycleState, ctx: &mut FsmContext) {
        let next_idx = next as usize;

        info!(
            "CTRL: transition {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        (self.table[self.current].on_transit)(ctx, Phase::Exit);
        self.current = next_idx;
        self.transitions += 1;
        (self.table[self.current].on_transit)(ctx, Phase::Enter);
    }
}
