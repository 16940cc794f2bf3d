//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::SensorError;

use super::service::{LoopStats, OutputState};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Pins are configured and the loop is about to take its first sample.
    Started { threshold_cm: f32 },

    /// A measurement succeeded and the output was written.
    Sample { distance_cm: f32, output: OutputState },

    /// A measurement failed; `output` is what the failure policy wrote.
    MeasurementFailed { error: SensorError, output: OutputState },

    /// The loop observed the stop request and released the pins.
    Stopped(LoopStats),
}
