//! Unified error types for the rangelight firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! startup path's error handling uniform. All variants are `Copy` so they
//! can be carried through events and loop statistics without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pin interface is unavailable or rejected a configuration.
    /// Fatal at startup.
    PinAccess(PinError),
    /// Configuration failed validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinAccess(e) => write!(f, "pin access: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Pin errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// Direction/mode configuration was rejected (carries the pin number).
    SetupFailed(u8),
    /// Driving an output level failed.
    WriteFailed(u8),
    /// Sampling an input level failed.
    ReadFailed(u8),
    /// The pin was never set up, or does not exist on this board.
    InvalidPin(u8),
    /// Returning the pin to its reset state failed.
    ResetFailed(u8),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetupFailed(pin) => write!(f, "GPIO{pin} setup failed"),
            Self::WriteFailed(pin) => write!(f, "GPIO{pin} write failed"),
            Self::ReadFailed(pin) => write!(f, "GPIO{pin} read failed"),
            Self::InvalidPin(pin) => write!(f, "GPIO{pin} not available"),
            Self::ResetFailed(pin) => write!(f, "GPIO{pin} reset failed"),
        }
    }
}

impl std::error::Error for PinError {}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Self::PinAccess(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Which echo edge the driver was waiting for when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoEdge {
    Rising,
    Falling,
}

impl fmt::Display for EchoEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No echo edge within the bounded window: target out of range,
    /// sensor misaligned or disconnected.
    MeasurementTimeout { edge: EchoEdge },
    /// The echo line could not be sampled, or the trigger could not be driven.
    Pin(PinError),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeasurementTimeout { edge } => {
                write!(f, "echo timeout waiting for {edge} edge")
            }
            Self::Pin(e) => write!(f, "{e}"),
        }
    }
}

impl From<PinError> for SensorError {
    fn from(e: PinError) -> Self {
        Self::Pin(e)
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
