//! Rangelight Firmware: Main Entry Point
//!
//! Polls an HC-SR04 rangefinder every 500 ms and lights the indicator LED
//! while something is closer than the threshold.  Runs until the stop
//! button is pressed, then releases the pins and returns.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  HardwareAdapter<EspGpio, EspClock>   FirmwareSink       │
//! │  (RangeSensor + Pin + Clock)          (log + watchdog)   │
//! │                                                          │
//! │  ───────────── Port Trait Boundary ─────────────         │
//! │                                                          │
//! │  ┌──────────────────────────────────────────────────┐    │
//! │  │   ControlLoop (threshold · failure policy)        │    │
//! │  └──────────────────────────────────────────────────┘    │
//! │                                                          │
//! │  StopToken ◀── stop-button ISR                           │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{error, info};

use rangelight::adapters::gpio::EspGpio;
use rangelight::adapters::hardware::HardwareAdapter;
use rangelight::adapters::log_sink::LogEventSink;
use rangelight::adapters::time::EspClock;
use rangelight::app::events::AppEvent;
use rangelight::app::ports::EventSink;
use rangelight::app::service::ControlLoop;
use rangelight::config::RangerConfig;
use rangelight::drivers::{stop_button, watchdog::{self, Watchdog}};
use rangelight::pins;
use rangelight::sensors::ultrasonic::DistanceSensor;
use rangelight::shutdown::StopToken;

// ── Event sink ────────────────────────────────────────────────
//
// Logs every event and feeds the watchdog once per finished iteration,
// so a loop stuck anywhere (sensor wait, delay) resets the board.

struct FirmwareSink {
    log: LogEventSink,
    watchdog: Watchdog,
}

impl EventSink for FirmwareSink {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        if matches!(
            event,
            AppEvent::Sample { .. } | AppEvent::MeasurementFailed { .. }
        ) {
            self.watchdog.feed();
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Rangelight v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = RangerConfig::default();
    config.validate().context("invalid configuration")?;

    // ── 3. Stop signal ────────────────────────────────────────
    let stop = StopToken::new();
    let button =
        stop_button::install(pins::STOP_BUTTON_GPIO, &stop).context("stop button")?;

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new(
        EspGpio::new(),
        EspClock::new(),
        DistanceSensor::new(&config),
    );
    let mut sink = FirmwareSink {
        log: LogEventSink::new(),
        watchdog: Watchdog::subscribe(watchdog::DEFAULT_TIMEOUT_MS),
    };

    // ── 5. Control loop ───────────────────────────────────────
    let mut control = ControlLoop::new(&config);
    let outcome = control.run(&mut hw, &stop, &mut sink);
    // Disarms the ISR and resets the button pin.
    drop(button);

    match outcome {
        Ok(stats) => {
            info!("Stopped cleanly after {} iterations", stats.iterations);
            Ok(())
        }
        Err(e) => {
            // Only startup can fail: pins were unavailable.
            error!("Startup failed: {}", e);
            Err(e.into())
        }
    }
}
