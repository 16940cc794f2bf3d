//! Stop button: the operator's interrupt signal.
//!
//! Active-low momentary switch on [`STOP_BUTTON_GPIO`](crate::pins::STOP_BUTTON_GPIO)
//! with the internal pull-up enabled.  A falling-edge ISR raises the
//! [`StopToken`]; the control loop notices at the top of its next
//! iteration.  No debouncing: the flag only ever goes one way, so bounce
//! just sets it again.
//!
//! [`install`] hands back a [`StopButton`] guard.  Releasing it (or
//! dropping it) removes the ISR handler and resets the pin, so shutdown
//! leaves the button line in the same state as the sensor and LED pins.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

use crate::error::PinError;
use crate::shutdown::StopToken;

/// ISR body.  `arg` is the pointer produced by [`StopToken::into_isr_arg`].
#[cfg(target_os = "espidf")]
unsafe extern "C" fn stop_button_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` points at the AtomicBool behind a StopToken, kept
    // alive until the handler is removed.  Atomic store is ISR-safe.
    let flag = unsafe { &*(arg as *const core::sync::atomic::AtomicBool) };
    flag.store(true, core::sync::atomic::Ordering::Release);
}

/// An armed stop button.  Disarms on [`release`](Self::release) or drop.
pub struct StopButton {
    pin: u8,
    armed: bool,
    #[cfg(target_os = "espidf")]
    isr_arg: *const core::sync::atomic::AtomicBool,
}

impl StopButton {
    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Remove the ISR handler and return the pin to its reset state.
    /// Idempotent.
    pub fn release(&mut self) -> Result<(), PinError> {
        if !self.armed {
            return Ok(());
        }
        self.armed = false;
        let result = self.disarm();
        match result {
            Ok(()) => info!("stop_button: GPIO{} released", self.pin),
            Err(e) => warn!("stop_button: {}", e),
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn disarm(&mut self) -> Result<(), PinError> {
        let pin = i32::from(self.pin);
        // SAFETY: the handler was registered by `install` with `isr_arg`;
        // once it is removed no ISR can touch the flag again.
        unsafe {
            gpio_intr_disable(pin);
            if gpio_isr_handler_remove(pin) != ESP_OK as i32 {
                // Handler may still fire: keep the leaked reference alive.
                return Err(PinError::ResetFailed(self.pin));
            }
            drop(StopToken::from_isr_arg(self.isr_arg));
            if gpio_reset_pin(pin) != ESP_OK as i32 {
                return Err(PinError::ResetFailed(self.pin));
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn disarm(&mut self) -> Result<(), PinError> {
        Ok(())
    }
}

impl Drop for StopButton {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Configure the button pin and register the stop ISR.
#[cfg(target_os = "espidf")]
pub fn install(pin: u8, stop: &StopToken) -> Result<StopButton, PinError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };

    // SAFETY: called once from main() before the loop; the ISR only
    // performs an atomic store.
    let isr_arg = unsafe {
        if gpio_config(&cfg) != ESP_OK as i32 {
            return Err(PinError::SetupFailed(pin));
        }

        // ESP_ERR_INVALID_STATE means the service is already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(PinError::SetupFailed(pin));
        }

        let isr_arg = stop.clone().into_isr_arg();
        let ret = gpio_isr_handler_add(
            i32::from(pin),
            Some(stop_button_isr),
            isr_arg as *mut core::ffi::c_void,
        );
        if ret != ESP_OK as i32 {
            drop(StopToken::from_isr_arg(isr_arg));
            return Err(PinError::SetupFailed(pin));
        }
        isr_arg
    };

    // From here on the guard owns the handler and undoes it on failure.
    let mut button = StopButton {
        pin,
        armed: true,
        isr_arg,
    };

    // SAFETY: the pin was configured above with a valid interrupt type.
    if unsafe { gpio_intr_enable(i32::from(pin)) } != ESP_OK as i32 {
        let _ = button.release();
        return Err(PinError::SetupFailed(pin));
    }

    info!("stop_button: ISR armed on GPIO{}", pin);
    Ok(button)
}

#[cfg(not(target_os = "espidf"))]
pub fn install(pin: u8, _stop: &StopToken) -> Result<StopButton, PinError> {
    info!("stop_button(sim): GPIO{} ISR skipped", pin);
    Ok(StopButton { pin, armed: true })
}
