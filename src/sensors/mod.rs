//! Sensor subsystem.
//!
//! Only one sensor on this board: the HC-SR04 class ultrasonic
//! rangefinder in [`ultrasonic`].

pub mod ultrasonic;
