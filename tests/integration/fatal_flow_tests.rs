//! Fatal paths: a broken state table must take the whole firmware down,
//! not just the loop task.

use std::process::{Command, Stdio};
use std::time::Duration;

use tramrun::app::controller::{self, Board};
use tramrun::config::TramConfig;
use tramrun::drivers::task_pin::{CONTROLLER_TASK, spawn_on_core};
use tramrun::events::Event;
use tramrun::fsm::context::FsmContext;
use tramrun::fsm::states::build_state_table;
use tramrun::fsm::{DispatchResult, Fsm, LifecycleState, Phase, StateDescriptor};

use crate::mock_hw::{AccessPoint, FramePanel, MockLine, MockServo, MockStation, RecordingSink, fast_config};

/// Set in the child process that runs the broken loop.
const CHILD_ENV: &str = "TRAMRUN_FATAL_FLOW_CHILD";

fn no_op(_: &mut FsmContext, _: Phase) {}

fn back_to_init(_: &mut FsmContext, _: Event) -> DispatchResult {
    DispatchResult::TransitRequested(LifecycleState::Init)
}

/// Bring every unit up, then run an Init state that asks for itself on a
/// task pinned like the real loop.
fn run_broken_loop() -> ! {
    let board = Board {
        display: FramePanel::new(),
        actuator: MockServo::default(),
        button: MockLine::default(),
        station: MockStation::new(AccessPoint::Unreachable),
    };
    let _units = controller::start(fast_config(), board, RecordingSink::default()).unwrap();

    let mut table = build_state_table();
    table[LifecycleState::Init as usize] = StateDescriptor {
        id: LifecycleState::Init,
        name: "Init",
        on_transit: no_op,
        on_event: back_to_init,
    };
    let task = spawn_on_core(CONTROLLER_TASK, move || {
        let mut fsm = Fsm::new(table, LifecycleState::Init);
        let mut ctx = FsmContext::detached(TramConfig::default());
        fsm.start(&mut ctx);
        fsm.dispatch_and_transit(Event::Tick, &mut ctx);
    })
    .unwrap();
    let _ = task.join();

    // Only reached if the units outlived the loop.
    std::thread::sleep(Duration::from_millis(200));
    std::process::exit(0);
}

#[test]
fn self_transition_on_the_loop_task_ends_the_process() {
    if std::env::var_os(CHILD_ENV).is_some() {
        run_broken_loop();
    }

    let status = Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "fatal_flow_tests::self_transition_on_the_loop_task_ends_the_process",
            "--test-threads=1",
        ])
        .env(CHILD_ENV, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert!(!status.success(), "process survived a self-transition");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(6), "expected SIGABRT, got {status:?}");
    }
}
