//! Cooperative stop signal.
//!
//! The control loop polls a [`StopToken`] at the top of every iteration.
//! Producers are the stop-button ISR on the board and plain code in tests;
//! both only ever store `true`, so a single atomic flag is enough.
//!
//! ```text
//! ┌─────────────┐   request_stop()   ┌────────────┐   is_stop_requested()   ┌──────────────┐
//! │ Button ISR  │──────────────────▶ │ AtomicBool │ ◀────────────────────── │ ControlLoop  │
//! └─────────────┘                    └────────────┘                         └──────────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, clonable stop flag.  Once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to finish after its current iteration.
    /// Lock-free; safe from ISR context.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Raw pointer to the flag for registration as an ISR argument.
    ///
    /// Leaks one strong reference so the pointer stays valid for the rest
    /// of the process, which is what an installed ISR needs.
    pub fn into_isr_arg(self) -> *const AtomicBool {
        Arc::into_raw(self.flag)
    }

    /// Reclaim the reference leaked by [`into_isr_arg`](Self::into_isr_arg).
    ///
    /// # Safety
    ///
    /// `arg` must come from `into_isr_arg`, be reclaimed at most once, and
    /// no ISR may still hold it.
    pub unsafe fn from_isr_arg(arg: *const AtomicBool) -> Self {
        // SAFETY: upheld by the caller.
        Self { flag: unsafe { Arc::from_raw(arg) } }
    }
}
