//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the logger
//! (UART / USB-CDC in production).  One line per iteration; the format is
//! for humans and carries no compatibility promise.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { threshold_cm } => {
                info!("START | threshold={:.1} cm", threshold_cm);
            }
            AppEvent::Sample { distance_cm, output } => {
                info!("Distance: {:.1} cm | led={:?}", distance_cm, output);
            }
            AppEvent::MeasurementFailed { error, output } => {
                warn!("Distance: n/a ({}) | led={:?}", error, output);
            }
            AppEvent::Stopped(stats) => {
                info!(
                    "STOP | iterations={} samples={} failures={} asserted={}",
                    stats.iterations, stats.samples, stats.failures, stats.asserted
                );
            }
        }
    }
}
