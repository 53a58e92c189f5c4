//! Display and actuator units driven through their public queues.

use std::time::Duration;

use tramrun::drivers::display::{DisplayCommand, DisplayService};
use tramrun::drivers::servo::{ActuatorCommand, ActuatorService};

use crate::mock_hw::{FramePanel, MockServo, PanelOp, wait_until};

#[test]
fn draw_renders_n_chars_and_clear_removes_them() {
    let panel = FramePanel::new();
    let display = DisplayService::init(panel.clone()).unwrap();

    display.send_event(DisplayCommand::draw("TRAM 42", 2));
    assert!(wait_until(Duration::from_secs(2), || panel.row(2) == "TRAM 42"));
    assert_eq!(panel.ops().last(), Some(&PanelOp::Draw {
        row: 2,
        text: "TRAM 42".into(),
    }));

    display.send_event(DisplayCommand::Clear);
    display.send_event(DisplayCommand::Clear);
    display.deinit();
    assert!(panel.is_blank());
}

#[test]
fn draw_keeps_other_rows_and_draw_and_clear_does_not() {
    let panel = FramePanel::new();
    let display = DisplayService::init(panel.clone()).unwrap();

    display.send_event(DisplayCommand::draw("one", 0));
    display.send_event(DisplayCommand::draw("two", 1));
    display.send_event(DisplayCommand::draw_and_clear("three", 5));
    display.deinit();

    assert_eq!(panel.row(0), "");
    assert_eq!(panel.row(1), "");
    assert_eq!(panel.row(5), "three");
}

#[test]
fn display_commands_run_in_send_order() {
    let panel = FramePanel::new();
    let display = DisplayService::init(panel.clone()).unwrap();
    for i in 0..20u8 {
        display.send_event(DisplayCommand::draw(&format!("{i}"), i % 8));
    }
    display.deinit();

    let draws: Vec<_> = panel
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            PanelOp::Draw { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    let expected: Vec<_> = (0..20).map(|i| i.to_string()).collect();
    assert_eq!(draws, expected);
}

#[test]
fn init_clears_the_panel_before_any_command() {
    let panel = FramePanel::new();
    let display = DisplayService::init(panel.clone()).unwrap();
    display.deinit();
    assert_eq!(panel.ops(), [PanelOp::Init, PanelOp::Clear]);
}

#[test]
fn actuator_centres_then_follows_commands() {
    let servo = MockServo::default();
    let actuator = ActuatorService::init(servo.clone()).unwrap();
    assert!(servo.centred.load(std::sync::atomic::Ordering::SeqCst));

    for angle in [10, 70, -90, 0] {
        actuator.send_event(ActuatorCommand::RotateTo(angle));
    }
    actuator.deinit();
    assert_eq!(servo.angles(), [10, 70, -90, 0]);
}

#[test]
fn producers_block_instead_of_dropping() {
    let servo = MockServo::default();
    let actuator = ActuatorService::init(servo.clone()).unwrap();
    let queue = actuator.queue();

    let producers: Vec<_> = (0..4)
        .map(|t| {
            let queue = queue.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    queue.send(ActuatorCommand::RotateTo((t * 25 + i) as i8));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    actuator.deinit();
    assert_eq!(servo.angles().len(), 100);
}
