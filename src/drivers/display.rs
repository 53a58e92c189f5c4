//! Display Service: the only code that touches the OLED panel.
//!
//! The controller never draws directly; it sends [`DisplayCommand`]s
//! through a bounded queue and the display task executes them in order.

use heapless::Vec;
use log::{debug, info, warn};

use super::service::{CommandQueue, PeripheralService};
use super::task_pin::DISPLAY_TASK;
use crate::app::ports::TextDisplay;
use crate::error::{Error, Result};

/// Longest text a single draw may carry (one 128 px row of 8 px cells).
pub const MAX_TEXT_LEN: usize = 16;

/// Display queue depth.
pub const DISPLAY_QUEUE_DEPTH: usize = 8;

pub type DisplayQueue = CommandQueue<DisplayCommand, DISPLAY_QUEUE_DEPTH>;

/// Bounded text for one draw; its length is the number of cells rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextLine {
    bytes: Vec<u8, MAX_TEXT_LEN>,
}

impl TextLine {
    /// Build from a string, truncating to [`MAX_TEXT_LEN`] bytes.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let n = bytes.len().min(MAX_TEXT_LEN);
        if n < bytes.len() {
            warn!("DISPLAY: text '{}' truncated to {} chars", text, MAX_TEXT_LEN);
        }
        let mut line = Vec::new();
        // Cannot fail: n <= capacity.
        let _ = line.extend_from_slice(&bytes[..n]);
        Self { bytes: line }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u8 {
        self.bytes.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Commands accepted by the display task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommand {
    /// Blank the whole panel.
    Clear,
    /// Write `text` on row `position`, leaving the rest of the panel intact.
    Draw { text: TextLine, position: u8 },
    /// Blank the panel, then write `text` on row `position`.
    DrawAndClear { text: TextLine, position: u8 },
}

impl DisplayCommand {
    pub fn draw(text: &str, position: u8) -> Self {
        Self::Draw {
            text: TextLine::new(text),
            position,
        }
    }

    pub fn draw_and_clear(text: &str, position: u8) -> Self {
        Self::DrawAndClear {
            text: TextLine::new(text),
            position,
        }
    }
}

/// Execute one command against the panel.  Errors are logged, never fatal.
pub fn apply<D: TextDisplay>(display: &mut D, cmd: DisplayCommand) {
    let result = match cmd {
        DisplayCommand::Clear => {
            debug!("DISPLAY: clear");
            display.clear()
        }
        DisplayCommand::Draw { text, position } => {
            debug!("DISPLAY: draw {:?} at row {}", text, position);
            display.draw_text(position, text.as_bytes())
        }
        DisplayCommand::DrawAndClear { text, position } => {
            debug!("DISPLAY: clear + draw {:?} at row {}", text, position);
            display
                .clear()
                .and_then(|()| display.draw_text(position, text.as_bytes()))
        }
    };
    if let Err(e) = result {
        warn!("DISPLAY: command failed: {}", e);
    }
}

/// Handle to the running display task.
pub struct DisplayService {
    service: PeripheralService<DisplayCommand, DISPLAY_QUEUE_DEPTH>,
}

impl DisplayService {
    /// Initialise the panel and hand it to a dedicated task.
    ///
    /// Fails if the panel does not come up; no task is started in that case.
    pub fn init<D: TextDisplay + Send + 'static>(mut display: D) -> Result<Self> {
        display.init().map_err(Error::Display)?;
        info!("DISPLAY: panel initialised");
        let service = PeripheralService::spawn(DISPLAY_TASK, move |cmd| apply(&mut display, cmd))?;
        Ok(Self { service })
    }

    /// Queue a command; blocks while the queue is full.
    pub fn send_event(&self, cmd: DisplayCommand) {
        self.service.send(cmd);
    }

    pub fn queue(&self) -> DisplayQueue {
        self.service.queue()
    }

    /// Stop the task once the queued commands have run.
    pub fn deinit(self) {
        info!("DISPLAY: deinit");
        self.service.shutdown();
    }
}
