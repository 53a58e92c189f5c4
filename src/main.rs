//! TramRun Firmware: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Ssd1306    Servo      PinDriver   EspStation   LogEventSink │
//! │  (Display)  (Actuator) (button)    (Wi-Fi)      (EventSink)  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │  Peripheral units (one task each, bounded queues)    │    │
//! │  │  DisplayService · ActuatorService                    │    │
//! │  │  InputMonitor · NetworkMonitor                       │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                           ▲                                  │
//! │  ┌────────────────────────┴─────────────────────────────┐    │
//! │  │  Controller: EventQueue(5) · 1 s poll · FSM          │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use tramrun::adapters::log_sink::LogEventSink;
use tramrun::adapters::nvs::NvsConfigStore;
use tramrun::app::controller;
use tramrun::config::TramConfig;
use tramrun::drivers::hw_init;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TramRun v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    // Erases and re-initialises the partition on a version mismatch.
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsConfigStore::new(nvs.clone()) {
        Ok(store) => store.load_or_default(),
        Err(e) => {
            warn!("NVS unavailable ({}), running with defaults", e);
            TramConfig::default()
        }
    };

    // ── 3. Board peripherals ──────────────────────────────────
    let board = match hw_init::init_board(peripherals, sysloop, nvs, &config) {
        Ok(board) => board,
        Err(e) => {
            error!("HAL init failed: {}, aborting", e);
            std::process::abort();
        }
    };

    // ── 4. Controller ─────────────────────────────────────────
    let _controller = match controller::start(config, board, LogEventSink::new()) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Controller start failed: {}, aborting", e);
            std::process::abort();
        }
    };
    info!("Boot complete");

    // The units run on their own tasks; keep their handles alive.
    loop {
        std::thread::park();
    }
}
