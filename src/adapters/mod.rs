//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                 | Connects to             |
//! |-------------|----------------------------|-------------------------|
//! | `gpio`      | PinPort                    | ESP32 GPIO matrix       |
//! | `hardware`  | RangeSensorPort            | HC-SR04 via `gpio`      |
//! |             | PinPort, ClockPort         | (delegates)             |
//! | `log_sink`  | EventSink                  | Serial log output       |
//! | `time`      | ClockPort                  | ESP32 high-res timer    |

pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod time;
