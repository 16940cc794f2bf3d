//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the main task to the ESP-IDF TWDT so the board resets if
//! the control loop wedges.  The loop feeds it once per completed
//! iteration; the subscription is dropped again on a clean stop so that
//! returning from `main` does not trip it.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Default reset timeout.  Several loop periods plus two echo timeouts.
pub const DEFAULT_TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    feeds: u64,
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn subscribe(timeout_ms: u32) -> Self {
        // SAFETY: TWDT calls from the main task during startup.
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK as i32 {
                log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            let subscribed = ret == ESP_OK as i32;
            if subscribed {
                info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
            } else {
                log::warn!("Watchdog: failed to subscribe ({})", ret);
            }

            Self { subscribed, feeds: 0 }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn subscribe(timeout_ms: u32) -> Self {
        info!("Watchdog(sim): {}ms timeout, no-op", timeout_ms);
        Self { feeds: 0 }
    }

    /// Reset the countdown.
    pub fn feed(&mut self) {
        self.feeds += 1;
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the TWDT entry for the current (subscribed) task.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }

    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: removes the current task's own subscription.
                unsafe {
                    esp_task_wdt_delete(core::ptr::null_mut());
                }
            }
        }
        info!("Watchdog: released after {} feeds", self.feeds);
    }
}
