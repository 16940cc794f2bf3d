//! Application layer: hexagonal core for the proximity indicator.
//!
//! - [`ports`]: trait boundaries (GPIO, clock, event sink)
//! - [`events`]: outbound diagnostic events
//! - [`service`]: the sampling / threshold-decision loop

pub mod events;
pub mod ports;
pub mod service;
