//! Fuzz target: lifecycle FSM under arbitrary event streams
//!
//! Each input byte selects one event. Invariants checked:
//! - No panics or aborts (the production table never requests a self-transition)
//! - The lifecycle only moves forward: Init, ConnectingToNetwork, Run
//! - Every transition is reported exactly once by `transitions()`
//!
//! cargo fuzz run fuzz_fsm_events

#![no_main]

use libfuzzer_sys::fuzz_target;
use tramrun::config::TramConfig;
use tramrun::events::Event;
use tramrun::fsm::context::FsmContext;
use tramrun::fsm::states::build_state_table;
use tramrun::fsm::{Fsm, LifecycleState};

fuzz_target!(|data: &[u8]| {
    let cfg = TramConfig {
        init_ticks: 2,
        ..TramConfig::default()
    };
    let mut fsm = Fsm::new(build_state_table(), LifecycleState::Init);
    let mut ctx = FsmContext::detached(cfg);
    fsm.start(&mut ctx);

    let mut last = fsm.current_state();
    let mut moves = 0u64;
    for &b in data {
        let event = Event::ALL[usize::from(b) % Event::ALL.len()];
        fsm.dispatch_and_transit(event, &mut ctx);

        let now = fsm.current_state();
        assert!(now as usize >= last as usize, "lifecycle went backwards");
        if now != last {
            moves += 1;
        }
        last = now;

        // Nothing consumes the queues here; keep them from filling.
        while ctx.display.try_receive().is_some() {}
        while ctx.actuator.try_receive().is_some() {}
        while ctx.network.queue().try_receive().is_some() {}
    }
    assert_eq!(fsm.transitions(), moves);
});
