//! HC-SR04 ultrasonic rangefinder driver.
//!
//! One measurement cycle:
//!
//! ```text
//!  TRIG  ──┐    ┌─ 10 µs ─┐
//!          └────┘         └──────────────────────────────
//!  ECHO  ─────────────────────┐                 ┌────────
//!                             └── round trip ───┘
//! ```
//!
//! The sensor answers a trigger pulse by holding ECHO high for the
//! round-trip time of the ping.  Both edge waits are bounded by
//! `echo_timeout_us`; a missing or stuck echo becomes a
//! [`SensorError::MeasurementTimeout`] instead of a hang.
//!
//! The driver keeps no state between calls.  Pins and clock are borrowed
//! per call so the same instances can be shared with the indicator.

use embedded_hal::digital::PinState;
use log::debug;

use crate::app::ports::{ClockPort, PinDirection, PinPort};
use crate::config::RangerConfig;
use crate::error::{EchoEdge, PinError, SensorError};

/// Time TRIG is held low before the pulse so the sensor sees a clean edge.
const TRIGGER_SETTLE_US: u32 = 2;

/// Result of one successful ping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Distance to the nearest reflecting surface (cm, non-negative).
    pub distance_cm: f32,
    /// Width of the echo pulse that produced it (µs).
    pub pulse_us: u32,
}

impl Measurement {
    /// Convert an echo pulse width to a distance.  The pulse covers the
    /// round trip, hence the halving.
    pub fn from_pulse(pulse_us: u32, speed_of_sound_cm_per_us: f32) -> Self {
        Self {
            distance_cm: pulse_us as f32 * speed_of_sound_cm_per_us / 2.0,
            pulse_us,
        }
    }
}

/// Distance sensor driver.
#[derive(Debug, Clone)]
pub struct DistanceSensor {
    trigger_pin: u8,
    echo_pin: u8,
    trigger_pulse_us: u32,
    echo_timeout_us: u32,
    echo_poll_us: u32,
    cm_per_us: f32,
}

impl DistanceSensor {
    pub fn new(config: &RangerConfig) -> Self {
        Self {
            trigger_pin: config.trigger_pin,
            echo_pin: config.echo_pin,
            trigger_pulse_us: config.trigger_pulse_us,
            echo_timeout_us: config.echo_timeout_us,
            echo_poll_us: config.echo_poll_us,
            cm_per_us: config.speed_of_sound_cm_per_us(),
        }
    }

    /// Configure TRIG as output (idling low) and ECHO as input.
    pub fn initialize(&self, pins: &mut impl PinPort) -> Result<(), PinError> {
        pins.setup(self.trigger_pin, PinDirection::Output)?;
        pins.write(self.trigger_pin, PinState::Low)?;
        pins.setup(self.echo_pin, PinDirection::Input)?;
        debug!(
            "ultrasonic: TRIG=GPIO{} ECHO=GPIO{} ready",
            self.trigger_pin, self.echo_pin
        );
        Ok(())
    }

    /// Fire one ping and time the echo.
    pub fn measure(
        &self,
        pins: &mut impl PinPort,
        clock: &mut impl ClockPort,
    ) -> Result<Measurement, SensorError> {
        self.fire_trigger(pins, clock)?;

        let rise_us = self.wait_for_echo(pins, clock, true, EchoEdge::Rising)?;
        let fall_us = self.wait_for_echo(pins, clock, false, EchoEdge::Falling)?;

        // Monotonic clock: fall >= rise.  Clamp for the u32 field anyway.
        let pulse_us = fall_us.saturating_sub(rise_us).min(u64::from(u32::MAX)) as u32;
        Ok(Measurement::from_pulse(pulse_us, self.cm_per_us))
    }

    fn fire_trigger(
        &self,
        pins: &mut impl PinPort,
        clock: &mut impl ClockPort,
    ) -> Result<(), PinError> {
        pins.write(self.trigger_pin, PinState::Low)?;
        clock.delay_us(TRIGGER_SETTLE_US);
        pins.write(self.trigger_pin, PinState::High)?;
        clock.delay_us(self.trigger_pulse_us);
        pins.write(self.trigger_pin, PinState::Low)
    }

    /// Poll ECHO until it reads `level`; returns the timestamp it was seen.
    fn wait_for_echo(
        &self,
        pins: &mut impl PinPort,
        clock: &mut impl ClockPort,
        level: bool,
        edge: EchoEdge,
    ) -> Result<u64, SensorError> {
        let start = clock.now_us();
        loop {
            if pins.read(self.echo_pin)? == level {
                return Ok(clock.now_us());
            }
            if clock.now_us().saturating_sub(start) >= u64::from(self.echo_timeout_us) {
                return Err(SensorError::MeasurementTimeout { edge });
            }
            clock.delay_us(self.echo_poll_us);
        }
    }
}
