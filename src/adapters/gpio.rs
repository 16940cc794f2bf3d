//! ESP32 GPIO adapter implementing [`PinPort`].
//!
//! ## Dual-target design
//!
//! - **`target_os = "espidf"`**: raw ESP-IDF `gpio_config` /
//!   `gpio_set_level` / `gpio_get_level` / `gpio_reset_pin` calls.
//! - **`not(target_os = "espidf")`**: in-memory level register so the
//!   adapter's bookkeeping is testable on the host.
//!
//! Either way the adapter tracks which pins it configured and in which
//! direction, refuses traffic on pins it never set up, and resets exactly
//! those pins on [`cleanup`](PinPort::cleanup).

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use embedded_hal::digital::PinState;
use log::{debug, info, warn};

use crate::app::ports::{PinDirection, PinPort};
use crate::error::PinError;

/// Highest GPIO number on the ESP32-S3.
pub const MAX_GPIO: u8 = 48;

pub struct EspGpio {
    /// Bit n set = GPIO n configured by this adapter.
    configured: u64,
    /// Bit n set = GPIO n configured as output.
    outputs: u64,
    #[cfg(not(target_os = "espidf"))]
    levels: u64,
    /// Host-only: bit n set = resetting GPIO n reports a driver error.
    #[cfg(not(target_os = "espidf"))]
    reset_faults: u64,
}

impl Default for EspGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl EspGpio {
    pub fn new() -> Self {
        Self {
            configured: 0,
            outputs: 0,
            #[cfg(not(target_os = "espidf"))]
            levels: 0,
            #[cfg(not(target_os = "espidf"))]
            reset_faults: 0,
        }
    }

    fn mask(pin: u8) -> Result<u64, PinError> {
        if pin > MAX_GPIO {
            return Err(PinError::InvalidPin(pin));
        }
        Ok(1u64 << pin)
    }

    fn require(&self, pin: u8, output: bool) -> Result<u64, PinError> {
        let bit = Self::mask(pin)?;
        let is_output = self.outputs & bit != 0;
        if self.configured & bit == 0 || is_output != output {
            return Err(PinError::InvalidPin(pin));
        }
        Ok(bit)
    }

    pub fn is_configured(&self, pin: u8) -> bool {
        Self::mask(pin).is_ok_and(|bit| self.configured & bit != 0)
    }

    // ── Register access ───────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn hw_config(&mut self, pin: u8, bit: u64, direction: PinDirection) -> Result<(), PinError> {
        let mode = match direction {
            PinDirection::Input => gpio_mode_t_GPIO_MODE_INPUT,
            PinDirection::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
        };
        let cfg = gpio_config_t {
            pin_bit_mask: bit,
            mode,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: gpio_config only touches the pins in `pin_bit_mask`,
        // which was range-checked by `mask()`.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(PinError::SetupFailed(pin));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn hw_config(&mut self, _pin: u8, bit: u64, _direction: PinDirection) -> Result<(), PinError> {
        self.levels &= !bit;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn hw_write(&mut self, pin: u8, _bit: u64, high: bool) -> Result<(), PinError> {
        // SAFETY: pin is configured as output (checked by `require`).
        let ret = unsafe { gpio_set_level(i32::from(pin), u32::from(high)) };
        if ret != ESP_OK as i32 {
            return Err(PinError::WriteFailed(pin));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn hw_write(&mut self, _pin: u8, bit: u64, high: bool) -> Result<(), PinError> {
        if high {
            self.levels |= bit;
        } else {
            self.levels &= !bit;
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn hw_read(&self, pin: u8, _bit: u64) -> bool {
        // SAFETY: register read on a configured input pin.
        (unsafe { gpio_get_level(i32::from(pin)) }) != 0
    }

    #[cfg(not(target_os = "espidf"))]
    fn hw_read(&self, _pin: u8, bit: u64) -> bool {
        self.levels & bit != 0
    }

    #[cfg(target_os = "espidf")]
    fn hw_reset(&mut self, pin: u8) -> Result<(), PinError> {
        // SAFETY: returns the pin to its power-on state; pin < MAX_GPIO.
        let ret = unsafe { gpio_reset_pin(i32::from(pin)) };
        if ret != ESP_OK as i32 {
            return Err(PinError::ResetFailed(pin));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn hw_reset(&mut self, pin: u8) -> Result<(), PinError> {
        let bit = 1u64 << pin;
        self.levels &= !bit;
        if self.reset_faults & bit != 0 {
            return Err(PinError::ResetFailed(pin));
        }
        Ok(())
    }

    /// Host-only: make the next cleanup report a driver error for `pin`.
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_reset_on(&mut self, pin: u8) {
        self.reset_faults |= 1u64 << pin;
    }

    /// Host-only: drive an input pin from a test, as the wire would.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_input_level(&mut self, pin: u8, high: bool) -> Result<(), PinError> {
        let bit = self.require(pin, false)?;
        self.hw_write(pin, bit, high)
    }

    /// Host-only: current level of any configured pin.
    #[cfg(not(target_os = "espidf"))]
    pub fn level(&self, pin: u8) -> Option<bool> {
        let bit = Self::mask(pin).ok()?;
        (self.configured & bit != 0).then_some(self.levels & bit != 0)
    }
}

impl PinPort for EspGpio {
    fn setup(&mut self, pin: u8, direction: PinDirection) -> Result<(), PinError> {
        let bit = Self::mask(pin)?;
        self.hw_config(pin, bit, direction)?;

        self.configured |= bit;
        match direction {
            PinDirection::Output => self.outputs |= bit,
            PinDirection::Input => self.outputs &= !bit,
        }
        debug!("gpio: GPIO{} -> {:?}", pin, direction);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<bool, PinError> {
        let bit = self.require(pin, false).map_err(|_| PinError::ReadFailed(pin))?;
        Ok(self.hw_read(pin, bit))
    }

    fn write(&mut self, pin: u8, level: PinState) -> Result<(), PinError> {
        let bit = self.require(pin, true).map_err(|_| PinError::WriteFailed(pin))?;
        self.hw_write(pin, bit, level == PinState::High)
    }

    fn cleanup(&mut self) -> Result<(), PinError> {
        let mut released = 0u32;
        let mut first_failure = None;
        for pin in 0..=MAX_GPIO {
            if self.configured & (1u64 << pin) == 0 {
                continue;
            }
            match self.hw_reset(pin) {
                Ok(()) => released += 1,
                Err(e) => {
                    warn!("gpio: {}", e);
                    first_failure.get_or_insert(e);
                }
            }
        }
        self.configured = 0;
        self.outputs = 0;
        info!("gpio: {} pins reset", released);
        first_failure.map_or(Ok(()), Err)
    }
}
