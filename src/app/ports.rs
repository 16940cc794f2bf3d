//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop / DistanceSensor (domain)
//! ```
//!
//! Driven adapters (GPIO backends, clocks, sensors, event sinks) implement these
//! traits.  The [`ControlLoop`](super::service::ControlLoop) consumes them
//! via generics, so the domain core never touches hardware directly and a
//! simulated backend can stand in for the board in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::error::{PinError, SensorError};
use crate::sensors::ultrasonic::Measurement;

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// Direction a GPIO line is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// The narrow GPIO capability set the core depends on.
///
/// Pins are addressed by board GPIO number (see [`crate::pins`]).
pub trait PinPort {
    /// Configure `pin` as input or output.  Calling it again with the same
    /// direction is harmless.
    fn setup(&mut self, pin: u8, direction: PinDirection) -> Result<(), PinError>;

    /// Sample an input pin.  `true` = HIGH.
    fn read(&mut self, pin: u8) -> Result<bool, PinError>;

    /// Drive an output pin.
    fn write(&mut self, pin: u8, level: PinState) -> Result<(), PinError>;

    /// Return every pin this backend configured to its reset state.
    fn cleanup(&mut self) -> Result<(), PinError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ timers)
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus blocking delays.
///
/// Delays come from [`DelayNs`] so the ESP-IDF `Ets`/`FreeRtos` delays and
/// any `embedded-hal` delay provider plug in unchanged.
pub trait ClockPort: DelayNs {
    /// Microseconds since an arbitrary fixed origin.  Never goes backwards.
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Range sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the control loop calls this to obtain distances.
pub trait RangeSensorPort {
    /// Configure the sensor's signal lines.  Called once before sampling.
    fn init_sensor(&mut self) -> Result<(), PinError>;

    /// Take one fresh measurement.
    fn measure_distance(&mut self) -> Result<Measurement, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// watchdog heartbeat, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
