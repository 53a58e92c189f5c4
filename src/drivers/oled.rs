//! SSD1306 128x64 OLED as a text panel.
//!
//! ## Hardware
//!
//! The `ssd1306` crate drives the controller in buffered graphics mode
//! over I2C.  Text is rendered into the frame buffer with an
//! `embedded-graphics` mono font and pushed to the panel on every call.
//!
//! ## Layout
//!
//! Eight 8-pixel rows of 5x8 character cells; a row shows up to
//! [`MAX_TEXT_LEN`] characters.  Bytes outside printable ASCII render
//! as `?`.

use embedded_graphics::{
    mono_font::{MonoTextStyle, MonoTextStyleBuilder, ascii::FONT_5X8},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use embedded_hal::i2c::I2c;
use heapless::String;
use log::{info, warn};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use crate::app::ports::TextDisplay;
use crate::config::DISPLAY_ROWS;
use crate::drivers::display::MAX_TEXT_LEN;
use crate::error::DriverError;

/// Pixel height of one text row.
pub const ROW_HEIGHT: i32 = 8;

/// Pre-charge period used with a custom contrast (the driver's default).
const PRECHARGE: u8 = 0x2;

/// The concrete panel: 128x64, buffered, on an I2C bus.
pub type Oled<I> = Ssd1306<I2CInterface<I>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Wrap an I2C bus as a buffered 128x64 panel at `address`.
pub fn oled<I: I2c>(i2c: I, address: u8) -> Oled<I> {
    Ssd1306::new(
        I2CDisplayInterface::new_custom_address(i2c, address),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode()
}

/// A monochrome frame buffer that can be pushed to glass.
pub trait Frame: DrawTarget<Color = BinaryColor> {
    /// Power the panel on and program its contrast.
    fn power_on(&mut self, contrast: u8) -> Result<(), DriverError>;

    /// Send the buffered frame to the panel.
    fn flush_frame(&mut self) -> Result<(), DriverError>;
}

impl<I: I2c> Frame for Oled<I> {
    fn power_on(&mut self, contrast: u8) -> Result<(), DriverError> {
        self.init().map_err(|e| {
            warn!("DISPLAY: panel init failed ({:?})", e);
            DriverError::Bus
        })?;
        self.set_brightness(Brightness::custom(PRECHARGE, contrast))
            .map_err(|e| {
                warn!("DISPLAY: contrast write failed ({:?})", e);
                DriverError::Bus
            })
    }

    fn flush_frame(&mut self) -> Result<(), DriverError> {
        self.flush().map_err(|e| {
            warn!("DISPLAY: flush failed ({:?})", e);
            DriverError::Bus
        })
    }
}

/// Row-oriented text on top of any [`Frame`].
pub struct TextPanel<F> {
    frame: F,
    contrast: u8,
}

impl<F: Frame> TextPanel<F> {
    pub fn new(frame: F, contrast: u8) -> Self {
        Self { frame, contrast }
    }

    /// Give the frame back.
    pub fn release(self) -> F {
        self.frame
    }
}

/// The background colour blanks each cell before its glyph lands.
fn cell_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_5X8)
        .text_color(BinaryColor::On)
        .background_color(BinaryColor::Off)
        .build()
}

/// Printable ASCII as-is, everything else as `?`.
fn to_cells(text: &[u8]) -> String<MAX_TEXT_LEN> {
    let mut cells = String::new();
    for &b in text.iter().take(MAX_TEXT_LEN) {
        let ch = if (0x20..0x7F).contains(&b) { char::from(b) } else { '?' };
        // Cannot fail: at most MAX_TEXT_LEN single-byte chars.
        let _ = cells.push(ch);
    }
    cells
}

impl<F: Frame> TextDisplay for TextPanel<F> {
    fn init(&mut self) -> Result<(), DriverError> {
        self.frame.power_on(self.contrast)?;
        self.clear()?;
        info!("DISPLAY: SSD1306 ready, contrast 0x{:02X}", self.contrast);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DriverError> {
        self.frame
            .clear(BinaryColor::Off)
            .map_err(|_| DriverError::Bus)?;
        self.frame.flush_frame()
    }

    fn draw_text(&mut self, row: u8, text: &[u8]) -> Result<(), DriverError> {
        if row >= DISPLAY_ROWS {
            warn!("DISPLAY: row {} off panel, ignored", row);
            return Ok(());
        }
        let cells = to_cells(text);
        let origin = Point::new(0, i32::from(row) * ROW_HEIGHT);
        Text::with_baseline(&cells, origin, cell_style(), Baseline::Top)
            .draw(&mut self.frame)
            .map_err(|_| DriverError::Bus)?;
        self.frame.flush_frame()
    }
}
