//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] turns a stream of distance measurements into the
//! indicator's on/off decision.  All I/O flows through port traits
//! injected at call sites, so the loop runs unchanged against the board
//! or a mock.
//!
//! ```text
//!  RangeSensorPort ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                      │     ControlLoop      │
//!          PinPort ◀── │ threshold · policy   │
//!                      └──────────────────────┘
//! ```
//!
//! The decision is memoryless: every iteration writes the LED from the
//! latest sample alone, redundant writes included.  A target sitting right
//! at the threshold will chatter the output.

use core::ops::{Deref, DerefMut};

use embedded_hal::digital::PinState;
use log::{info, warn};

use crate::config::{FailurePolicy, RangerConfig};
use crate::error::{Result, SensorError};
use crate::sensors::ultrasonic::Measurement;
use crate::shutdown::StopToken;

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, PinDirection, PinPort, RangeSensorPort};

// ───────────────────────────────────────────────────────────────
// Output state
// ───────────────────────────────────────────────────────────────

/// Indicator output, owned by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputState {
    Asserted,
    #[default]
    Deasserted,
}

impl OutputState {
    /// Strict less-than: a target exactly at the threshold is "far".
    pub fn decide(distance_cm: f32, threshold_cm: f32) -> Self {
        if distance_cm < threshold_cm {
            Self::Asserted
        } else {
            Self::Deasserted
        }
    }

    pub fn is_asserted(self) -> bool {
        self == Self::Asserted
    }

    /// Pin level for an active-high LED.
    pub fn level(self) -> PinState {
        match self {
            Self::Asserted => PinState::High,
            Self::Deasserted => PinState::Low,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Loop statistics
// ───────────────────────────────────────────────────────────────

/// Counters accumulated over one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    pub iterations: u64,
    pub samples: u64,
    pub failures: u64,
    /// Iterations that ended with the LED on.
    pub asserted: u64,
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    threshold_cm: f32,
    policy: FailurePolicy,
    led_pin: u8,
    interval_ms: u32,
    output: OutputState,
    stats: LoopStats,
}

impl ControlLoop {
    pub fn new(config: &RangerConfig) -> Self {
        Self {
            threshold_cm: config.threshold_cm,
            policy: config.failure_policy,
            led_pin: config.led_pin,
            interval_ms: config.sample_interval_ms,
            output: OutputState::Deasserted,
            stats: LoopStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure the sensor lines and the indicator pin (driven low).
    ///
    /// Any pin failure here is fatal: the caller must not enter the loop.
    pub fn start(
        &mut self,
        hw: &mut (impl RangeSensorPort + PinPort),
        sink: &mut impl EventSink,
    ) -> Result<()> {
        hw.init_sensor()?;
        hw.setup(self.led_pin, PinDirection::Output)?;
        hw.write(self.led_pin, PinState::Low)?;
        self.output = OutputState::Deasserted;

        sink.emit(&AppEvent::Started {
            threshold_cm: self.threshold_cm,
        });
        info!(
            "ControlLoop started: threshold={:.1}cm interval={}ms policy={:?}",
            self.threshold_cm, self.interval_ms, self.policy
        );
        Ok(())
    }

    /// Run until `stop` is raised, then release the pins and return.
    ///
    /// The stop flag is checked at the top of each iteration.  Pin cleanup
    /// runs exactly once on every way out of this function, including a
    /// failed start and an unwinding panic.
    pub fn run<H>(
        &mut self,
        hw: &mut H,
        stop: &StopToken,
        sink: &mut impl EventSink,
    ) -> Result<LoopStats>
    where
        H: RangeSensorPort + PinPort + ClockPort,
    {
        let mut hw = PinCleanup::new(hw, self.led_pin);
        self.start(&mut *hw, sink)?;

        while !stop.is_stop_requested() {
            self.step(&mut *hw, sink);
            hw.delay_ms(self.interval_ms);
        }

        info!("Stop requested after {} iterations", self.stats.iterations);
        hw.release();
        sink.emit(&AppEvent::Stopped(self.stats));
        Ok(self.stats)
    }

    // ── Per-iteration decision ────────────────────────────────

    /// One iteration: sample, decide, write the LED, report.
    ///
    /// Never fails: measurement errors go through the failure policy and
    /// LED write errors are logged.
    pub fn step(
        &mut self,
        hw: &mut (impl RangeSensorPort + PinPort),
        sink: &mut impl EventSink,
    ) -> OutputState {
        let result = hw.measure_distance();
        let (output, event) = self.apply(result);

        if let Err(e) = hw.write(self.led_pin, output.level()) {
            warn!("LED write failed: {}", e);
        }
        sink.emit(&event);
        output
    }

    /// Fold one measurement result into the output state.
    fn apply(
        &mut self,
        result: core::result::Result<Measurement, SensorError>,
    ) -> (OutputState, AppEvent) {
        self.stats.iterations += 1;

        let (output, event) = match result {
            Ok(m) => {
                self.stats.samples += 1;
                let output = OutputState::decide(m.distance_cm, self.threshold_cm);
                (
                    output,
                    AppEvent::Sample {
                        distance_cm: m.distance_cm,
                        output,
                    },
                )
            }
            Err(error) => {
                self.stats.failures += 1;
                let output = match self.policy {
                    FailurePolicy::TreatAsFar => OutputState::Deasserted,
                    FailurePolicy::HoldPrevious => self.output,
                };
                (output, AppEvent::MeasurementFailed { error, output })
            }
        };

        if output.is_asserted() {
            self.stats.asserted += 1;
        }
        self.output = output;
        (output, event)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn output(&self) -> OutputState {
        self.output
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }
}

// ───────────────────────────────────────────────────────────────
// Cleanup guard
// ───────────────────────────────────────────────────────────────

/// Owns the hardware borrow for the duration of [`ControlLoop::run`] and
/// puts the pins back on the way out, whichever way that is.
struct PinCleanup<'a, H: PinPort> {
    hw: &'a mut H,
    led_pin: u8,
    released: bool,
}

impl<'a, H: PinPort> PinCleanup<'a, H> {
    fn new(hw: &'a mut H, led_pin: u8) -> Self {
        Self {
            hw,
            led_pin,
            released: false,
        }
    }

    /// Deassert the LED and release every pin.  Idempotent.
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.hw.write(self.led_pin, PinState::Low) {
            warn!("cleanup: LED off failed: {}", e);
        }
        match self.hw.cleanup() {
            Ok(()) => info!("cleanup: pins released"),
            Err(e) => warn!("cleanup: {}", e),
        }
    }
}

impl<H: PinPort> Deref for PinCleanup<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.hw
    }
}

impl<H: PinPort> DerefMut for PinCleanup<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.hw
    }
}

impl<H: PinPort> Drop for PinCleanup<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}
