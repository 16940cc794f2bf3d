//! Board drivers outside the sensing path.

pub mod stop_button;
pub mod watchdog;
