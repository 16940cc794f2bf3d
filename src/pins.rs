//! GPIO pin assignments for the rangelight board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic rangefinder
// ---------------------------------------------------------------------------

/// Digital output: trigger line, idles LOW, pulsed HIGH to start a cycle.
pub const TRIGGER_GPIO: u8 = 4;
/// Digital input: echo line.  HIGH for the round-trip time of the ping.
/// Sensor runs at 5 V; route through a divider before this pin.
pub const ECHO_GPIO: u8 = 5;

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// Digital output: proximity LED (active HIGH).
pub const LED_GPIO: u8 = 14;

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// Momentary stop button, active-low with internal pull-up.
pub const STOP_BUTTON_GPIO: u8 = 0;
