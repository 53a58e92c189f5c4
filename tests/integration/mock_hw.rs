//! Mock hardware adapters for integration tests.
//!
//! Every mock shares its state through an `Arc` so the test keeps a
//! probe after the device half has been moved into a peripheral unit.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin};
use tramrun::app::events::ControllerEvent;
use tramrun::app::ports::{Actuator, EventSink, StationEvent, StationNotifier, TextDisplay, WifiStation};
use tramrun::config::{DISPLAY_ROWS, TramConfig};
use tramrun::drivers::display::MAX_TEXT_LEN;
use tramrun::error::DriverError;

const ROWS: usize = DISPLAY_ROWS as usize;

/// Config with short periods so threaded tests finish quickly.
pub fn fast_config() -> TramConfig {
    TramConfig {
        poll_period_ms: 20,
        input_poll_period_ms: 10,
        long_press_ms: 150,
        init_ticks: 2,
        ..TramConfig::default()
    }
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

// ── Text panel ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PanelOp {
    Init,
    Clear,
    Draw { row: u8, text: String },
}

/// 8 x 16 character grid.
#[derive(Default)]
pub struct PanelState {
    pub grid: [[u8; MAX_TEXT_LEN]; ROWS],
    pub ops: Vec<PanelOp>,
}

#[derive(Clone, Default)]
pub struct FramePanel {
    pub state: Arc<Mutex<PanelState>>,
    pub fail_init: bool,
}

#[allow(dead_code)]
impl FramePanel {
    pub fn new() -> Self {
        let panel = Self::default();
        panel.state.lock().unwrap().grid = [[b' '; MAX_TEXT_LEN]; ROWS];
        panel
    }

    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::new()
        }
    }

    /// Row contents with trailing blanks trimmed.
    pub fn row(&self, row: usize) -> String {
        let state = self.state.lock().unwrap();
        String::from_utf8_lossy(&state.grid[row]).trim_end().to_string()
    }

    pub fn is_blank(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.grid.iter().flatten().all(|&c| c == b' ')
    }

    pub fn ops(&self) -> Vec<PanelOp> {
        self.state.lock().unwrap().ops.clone()
    }
}

impl TextDisplay for FramePanel {
    fn init(&mut self) -> Result<(), DriverError> {
        if self.fail_init {
            return Err(DriverError::Bus);
        }
        self.state.lock().unwrap().ops.push(PanelOp::Init);
        self.clear()
    }

    fn clear(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.grid = [[b' '; MAX_TEXT_LEN]; ROWS];
        state.ops.push(PanelOp::Clear);
        Ok(())
    }

    fn draw_text(&mut self, row: u8, text: &[u8]) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let cells = &mut state.grid[usize::from(row)];
        cells[..text.len()].copy_from_slice(text);
        state.ops.push(PanelOp::Draw {
            row,
            text: String::from_utf8_lossy(text).into_owned(),
        });
        Ok(())
    }
}

// ── Servo ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockServo {
    pub centred: Arc<AtomicBool>,
    pub angles: Arc<Mutex<Vec<i8>>>,
}

#[allow(dead_code)]
impl MockServo {
    pub fn angles(&self) -> Vec<i8> {
        self.angles.lock().unwrap().clone()
    }
}

impl Actuator for MockServo {
    fn init(&mut self) -> Result<(), DriverError> {
        self.centred.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn rotate(&mut self, angle_deg: i8) -> Result<(), DriverError> {
        self.angles.lock().unwrap().push(angle_deg);
        Ok(())
    }
}

// ── Button line ───────────────────────────────────────────────

/// Active-low line; `press()` pulls it low.
#[derive(Clone, Default)]
pub struct MockLine {
    low: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockLine {
    pub fn press(&self) {
        self.low.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.low.store(false, Ordering::SeqCst);
    }
}

impl ErrorType for MockLine {
    type Error = core::convert::Infallible;
}

impl InputPin for MockLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.low.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.low.load(Ordering::SeqCst))
    }
}

// ── Wi-Fi station ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPoint {
    /// Every attempt associates and gets an address.
    Reachable,
    /// Every attempt ends in a disconnect.
    Unreachable,
}

#[derive(Clone)]
pub struct MockStation {
    ap: AccessPoint,
    notify: Option<StationNotifier>,
    pub starts: Arc<AtomicU32>,
    pub connects: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl MockStation {
    pub fn new(ap: AccessPoint) -> Self {
        Self {
            ap,
            notify: None,
            starts: Arc::default(),
            connects: Arc::default(),
        }
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    fn raise(&self, event: StationEvent) {
        if let Some(notify) = &self.notify {
            notify(event);
        }
    }
}

impl WifiStation for MockStation {
    fn init(&mut self, _config: &TramConfig, notify: StationNotifier) -> Result<(), DriverError> {
        self.notify = Some(notify);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DriverError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.raise(StationEvent::Started);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.ap {
            AccessPoint::Reachable => {
                self.raise(StationEvent::Connected);
                self.raise(StationEvent::GotIp);
            }
            AccessPoint::Unreachable => self.raise(StationEvent::Disconnected),
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        self.raise(StationEvent::Stopped);
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<ControllerEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn snapshot(&self) -> Vec<ControllerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &ControllerEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
