//! Hardware adapter: bridges a GPIO backend and a clock to the domain ports.
//!
//! Owns the pin backend, the clock and the [`DistanceSensor`] driver, and
//! exposes them through [`RangeSensorPort`], [`PinPort`] and [`ClockPort`].
//! The control loop receives this one value and never sees the pieces,
//! so the same pins serve both the sensor and the indicator.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::app::ports::{ClockPort, PinDirection, PinPort, RangeSensorPort};
use crate::error::{PinError, SensorError};
use crate::sensors::ultrasonic::{DistanceSensor, Measurement};

/// Concrete adapter that combines pins, clock and rangefinder behind port traits.
pub struct HardwareAdapter<P, C> {
    pins: P,
    clock: C,
    sensor: DistanceSensor,
}

impl<P: PinPort, C: ClockPort> HardwareAdapter<P, C> {
    pub fn new(pins: P, clock: C, sensor: DistanceSensor) -> Self {
        Self { pins, clock, sensor }
    }

    /// Hand the backend back (tests inspect recorded pin traffic this way).
    pub fn into_parts(self) -> (P, C) {
        (self.pins, self.clock)
    }
}

// ── RangeSensorPort implementation ────────────────────────────

impl<P: PinPort, C: ClockPort> RangeSensorPort for HardwareAdapter<P, C> {
    fn init_sensor(&mut self) -> Result<(), PinError> {
        self.sensor.initialize(&mut self.pins)
    }

    fn measure_distance(&mut self) -> Result<Measurement, SensorError> {
        self.sensor.measure(&mut self.pins, &mut self.clock)
    }
}

// ── PinPort implementation ────────────────────────────────────

impl<P: PinPort, C> PinPort for HardwareAdapter<P, C> {
    fn setup(&mut self, pin: u8, direction: PinDirection) -> Result<(), PinError> {
        self.pins.setup(pin, direction)
    }

    fn read(&mut self, pin: u8) -> Result<bool, PinError> {
        self.pins.read(pin)
    }

    fn write(&mut self, pin: u8, level: PinState) -> Result<(), PinError> {
        self.pins.write(pin, level)
    }

    fn cleanup(&mut self) -> Result<(), PinError> {
        self.pins.cleanup()
    }
}

// ── ClockPort implementation ──────────────────────────────────

impl<P, C: ClockPort> DelayNs for HardwareAdapter<P, C> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.delay_ns(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

impl<P, C: ClockPort> ClockPort for HardwareAdapter<P, C> {
    fn now_us(&self) -> u64 {
        self.clock.now_us()
    }
}
