//! End-to-end start-up flows: every unit on its own thread, mocks at
//! the port boundary, short periods.

use std::time::Duration;

use tramrun::app::controller::{self, Board};
use tramrun::app::events::ControllerEvent;
use tramrun::error::{DriverError, Error};
use tramrun::events::Event;
use tramrun::fsm::{DispatchResult, LifecycleState};

use crate::mock_hw::{
    AccessPoint, FramePanel, MockLine, MockServo, MockStation, RecordingSink, fast_config, wait_until,
};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Rig {
    panel: FramePanel,
    servo: MockServo,
    line: MockLine,
    station: MockStation,
    sink: RecordingSink,
    handle: controller::ControllerHandle,
}

fn boot(ap: AccessPoint) -> Rig {
    let panel = FramePanel::new();
    let servo = MockServo::default();
    let line = MockLine::default();
    let station = MockStation::new(ap);
    let sink = RecordingSink::default();

    let board = Board {
        display: panel.clone(),
        actuator: servo.clone(),
        button: line.clone(),
        station: station.clone(),
    };
    let handle = controller::start(fast_config(), board, sink.clone()).unwrap();
    Rig {
        panel,
        servo,
        line,
        station,
        sink,
        handle,
    }
}

fn entered(state: LifecycleState) -> impl Fn(&ControllerEvent) -> bool {
    move |e| matches!(e, ControllerEvent::StateChanged { to, .. } if *to == state)
}

fn dispatched(event: Event) -> impl Fn(&ControllerEvent) -> bool {
    move |e| matches!(e, ControllerEvent::Dispatched { event: ev, .. } if *ev == event)
}

#[test]
fn reachable_network_ends_in_run() {
    let rig = boot(AccessPoint::Reachable);

    assert!(wait_until(TIMEOUT, || rig.sink.count(entered(LifecycleState::Run)) == 1));
    assert!(wait_until(TIMEOUT, || rig.panel.row(3) == "Run"));
    assert!(wait_until(TIMEOUT, || rig.servo.angles() == [10, 70]));

    assert!(rig.servo.centred.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(rig.sink.snapshot()[0], ControllerEvent::Started(LifecycleState::Init));
    assert_eq!(rig.station.connects(), 1);
    assert!(!rig.handle.is_finished());

    // Status is the only thing on the panel after each DrawAndClear.
    for row in (0..8).filter(|&r| r != 3) {
        assert_eq!(rig.panel.row(row), "");
    }
}

#[test]
fn states_are_entered_in_order() {
    let rig = boot(AccessPoint::Reachable);
    assert!(wait_until(TIMEOUT, || rig.sink.count(entered(LifecycleState::Run)) == 1));

    let transitions: Vec<_> = rig
        .sink
        .snapshot()
        .into_iter()
        .filter_map(|e| match e {
            ControllerEvent::StateChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        [
            (LifecycleState::Init, LifecycleState::ConnectingToNetwork),
            (LifecycleState::ConnectingToNetwork, LifecycleState::Run),
        ]
    );
}

#[test]
fn unreachable_network_fails_once_and_stays_connecting() {
    let rig = boot(AccessPoint::Unreachable);

    assert!(wait_until(TIMEOUT, || rig.sink.count(dispatched(Event::NetworkFailed)) == 1));
    assert!(wait_until(TIMEOUT, || rig.panel.row(3) == "Wifi"));

    // Several more periods: no second report, no further attempts.
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(rig.sink.count(dispatched(Event::NetworkFailed)), 1);
    assert_eq!(rig.station.connects(), 5);
    assert_eq!(rig.sink.count(entered(LifecycleState::Run)), 0);
    assert!(rig.sink.contains(&ControllerEvent::Dispatched {
        state: LifecycleState::ConnectingToNetwork,
        event: Event::NetworkFailed,
        result: DispatchResult::Handled,
    }));
    assert_eq!(rig.servo.angles(), [10]);
}

#[test]
fn button_gestures_reach_the_controller() {
    let rig = boot(AccessPoint::Reachable);
    assert!(wait_until(TIMEOUT, || rig.sink.count(entered(LifecycleState::Run)) == 1));

    rig.line.press();
    std::thread::sleep(Duration::from_millis(40));
    rig.line.release();
    assert!(wait_until(TIMEOUT, || rig.sink.count(dispatched(Event::ButtonPress)) == 1));

    rig.line.press();
    std::thread::sleep(Duration::from_millis(400));
    rig.line.release();
    assert!(wait_until(TIMEOUT, || rig.sink.count(dispatched(Event::ButtonLongPress)) == 1));

    // Accepted, but nothing acts on them yet.
    assert_eq!(rig.sink.count(entered(LifecycleState::Run)), 1);
    assert_eq!(rig.sink.count(dispatched(Event::ButtonPress)), 1);
    assert!(rig.sink.contains(&ControllerEvent::Dispatched {
        state: LifecycleState::Run,
        event: Event::ButtonLongPress,
        result: DispatchResult::Ignored,
    }));
}

#[test]
fn injected_events_are_dispatched_by_the_loop() {
    let rig = boot(AccessPoint::Unreachable);
    assert!(wait_until(TIMEOUT, || rig.sink.count(dispatched(Event::NetworkFailed)) == 1));

    rig.handle.sender().post(Event::NetworkReady);
    assert!(wait_until(TIMEOUT, || rig.sink.count(entered(LifecycleState::Run)) == 1));
    assert!(wait_until(TIMEOUT, || rig.panel.row(3) == "Run"));
}

#[test]
fn display_init_failure_aborts_start() {
    let board = Board {
        display: FramePanel::failing(),
        actuator: MockServo::default(),
        button: MockLine::default(),
        station: MockStation::new(AccessPoint::Reachable),
    };
    let result = controller::start(fast_config(), board, RecordingSink::default());
    assert!(matches!(result, Err(Error::Display(DriverError::Bus))));
}
