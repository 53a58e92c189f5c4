//! Fuzz target: `PressDetector::sample`
//!
//! Input bytes are read in pairs `(level, delta_ms)` and fed as samples
//! with a monotonic clock. Invariants checked:
//! - Every gesture follows exactly one press edge
//! - A gesture is long iff the hold reached the threshold
//!
//! cargo fuzz run fuzz_press_detector

#![no_main]

use libfuzzer_sys::fuzz_target;
use tramrun::drivers::button::{ButtonEvent, PressDetector};

const LONG_PRESS_MS: u64 = 3000;

fuzz_target!(|data: &[u8]| {
    let mut detector = PressDetector::new(LONG_PRESS_MS as u32);
    let mut now = 0u64;
    let mut pressed_at: Option<u64> = None;

    for pair in data.chunks_exact(2) {
        let pressed = pair[0] & 1 == 1;
        now += u64::from(pair[1]) * 20;

        match detector.sample(pressed, now) {
            Some(gesture) => {
                let since = pressed_at.take().expect("gesture without a press");
                let long = now - since >= LONG_PRESS_MS;
                assert_eq!(gesture == ButtonEvent::LongPress, long);
            }
            None => {
                if pressed && pressed_at.is_none() {
                    pressed_at = Some(now);
                }
            }
        }
        assert_eq!(detector.is_pressed(), pressed_at.is_some());
    }
});
