//! System configuration parameters
//!
//! All tunable parameters for the rangelight indicator.  The values are
//! fixed at build time; the config is validated once at startup and only
//! borrowed afterwards.

use crate::error::Error;
use crate::pins;

/// What the control loop does with the indicator when a measurement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Treat the failed sample as "nothing in range": deassert and continue.
    #[default]
    TreatAsFar,
    /// Keep whatever the previous iteration decided.
    HoldPrevious,
}

/// Core system configuration
#[derive(Debug, Clone)]
pub struct RangerConfig {
    // --- Pins ---
    pub trigger_pin: u8,
    pub echo_pin: u8,
    pub led_pin: u8,

    // --- Decision ---
    /// Distance (cm) strictly below which the LED is switched on.
    pub threshold_cm: f32,
    /// Output behaviour on a failed measurement.
    pub failure_policy: FailurePolicy,

    // --- Sensor timing ---
    /// Width of the trigger pulse (microseconds).
    pub trigger_pulse_us: u32,
    /// Upper bound on each echo-edge wait (microseconds).
    pub echo_timeout_us: u32,
    /// Delay between echo-line polls (microseconds).
    pub echo_poll_us: u32,
    /// Speed of sound in air (metres per second).
    pub speed_of_sound_m_per_s: f32,

    // --- Loop timing ---
    /// Delay between the end of one decision and the next sample (milliseconds).
    pub sample_interval_ms: u32,
}

impl Default for RangerConfig {
    fn default() -> Self {
        Self {
            trigger_pin: pins::TRIGGER_GPIO,
            echo_pin: pins::ECHO_GPIO,
            led_pin: pins::LED_GPIO,

            threshold_cm: 10.0,
            failure_policy: FailurePolicy::TreatAsFar,

            trigger_pulse_us: 10,
            echo_timeout_us: 30_000, // ~5 m round trip, past the HC-SR04's 4 m range
            echo_poll_us: 5,
            speed_of_sound_m_per_s: 343.0, // dry air, 20 °C

            sample_interval_ms: 500,
        }
    }
}

impl RangerConfig {
    /// Speed of sound in the unit the driver works in.
    pub fn speed_of_sound_cm_per_us(&self) -> f32 {
        // m/s × 100 cm/m ÷ 1e6 µs/s
        self.speed_of_sound_m_per_s / 10_000.0
    }

    /// Reject values that would make the loop misbehave.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.threshold_cm.is_finite() || self.threshold_cm <= 0.0 {
            return Err(Error::Config("threshold_cm must be a positive number"));
        }
        if !self.speed_of_sound_m_per_s.is_finite() || self.speed_of_sound_m_per_s <= 0.0 {
            return Err(Error::Config("speed_of_sound_m_per_s must be positive"));
        }
        if self.trigger_pulse_us == 0 {
            return Err(Error::Config("trigger_pulse_us must be non-zero"));
        }
        if self.echo_poll_us == 0 {
            return Err(Error::Config("echo_poll_us must be non-zero"));
        }
        if self.echo_timeout_us <= self.echo_poll_us {
            return Err(Error::Config("echo_timeout_us must exceed echo_poll_us"));
        }
        if self.trigger_pin == self.echo_pin
            || self.trigger_pin == self.led_pin
            || self.echo_pin == self.led_pin
        {
            return Err(Error::Config("trigger, echo and LED pins must be distinct"));
        }
        Ok(())
    }
}
