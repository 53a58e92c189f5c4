//! Concrete state handler functions and table builder.
//!
//! Each state is defined by two plain `fn` pointers held in a fixed
//! table, the classic embedded C FSM pattern expressed in safe Rust.
//!
//! ```text
//!  INIT ──[countdown expired]──▶ CONNECTING_TO_NETWORK ──[NetworkReady]──▶ RUN
//!                                   │        ▲
//!                                   └────────┘
//!                                 [NetworkFailed]
//! ```
//!
//! Button events are accepted everywhere and acted on nowhere yet.

use super::context::FsmContext;
use super::{DispatchResult, LifecycleState, Phase, StateDescriptor};
use crate::events::Event;
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; LifecycleState::COUNT] {
    [
        // Index 0: Init
        StateDescriptor {
            id: LifecycleState::Init,
            name: "Init",
            on_transit: init_transit,
            on_event: init_event,
        },
        // Index 1: ConnectingToNetwork
        StateDescriptor {
            id: LifecycleState::ConnectingToNetwork,
            name: "ConnectingToNetwork",
            on_transit: connecting_transit,
            on_event: connecting_event,
        },
        // Index 2: Run
        StateDescriptor {
            id: LifecycleState::Run,
            name: "Run",
            on_transit: run_transit,
            on_event: run_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT state
// ═══════════════════════════════════════════════════════════════════════════

fn init_transit(ctx: &mut FsmContext, phase: Phase) {
    match phase {
        Phase::Enter => {
            ctx.show_status("Init");
            ctx.rotate_to(ctx.config.init_angle_deg);
        }
        Phase::Exit => {}
    }
}

fn init_event(ctx: &mut FsmContext, event: Event) -> DispatchResult {
    match event {
        Event::Tick => {
            ctx.init_countdown -= 1;
            if ctx.init_countdown < 0 {
                ctx.reset_init_countdown();
                info!("CTRL: init countdown expired");
                DispatchResult::TransitRequested(LifecycleState::ConnectingToNetwork)
            } else {
                debug!("CTRL: init countdown {}", ctx.init_countdown);
                DispatchResult::Handled
            }
        }
        Event::ButtonPress
        | Event::ButtonLongPress
        | Event::NetworkReady
        | Event::NetworkFailed => DispatchResult::Ignored,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING_TO_NETWORK state
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_transit(ctx: &mut FsmContext, phase: Phase) {
    match phase {
        Phase::Enter => {
            ctx.network.begin_association();
            ctx.show_status("Wifi");
        }
        Phase::Exit => {}
    }
}

fn connecting_event(_ctx: &mut FsmContext, event: Event) -> DispatchResult {
    match event {
        Event::NetworkReady => DispatchResult::TransitRequested(LifecycleState::Run),
        Event::NetworkFailed => {
            // Stay put; nothing above the station retries on our behalf.
            warn!("CTRL: network unavailable, staying in ConnectingToNetwork");
            DispatchResult::Handled
        }
        Event::ButtonPress | Event::ButtonLongPress | Event::Tick => DispatchResult::Ignored,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUN state
// ═══════════════════════════════════════════════════════════════════════════

fn run_transit(ctx: &mut FsmContext, phase: Phase) {
    match phase {
        Phase::Enter => {
            ctx.show_status("Run");
            ctx.rotate_to(ctx.config.run_angle_deg);
        }
        Phase::Exit => {}
    }
}

fn run_event(_ctx: &mut FsmContext, event: Event) -> DispatchResult {
    match event {
        Event::Tick => DispatchResult::Handled,
        Event::ButtonPress
        | Event::ButtonLongPress
        | Event::NetworkReady
        | Event::NetworkFailed => DispatchResult::Ignored,
    }
}
