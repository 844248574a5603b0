//! Actuator model
//!
//! Tracks commanded and reported lengths for every actuator, performs
//! homing, and detects feedback timeouts, stalls and out-of-bounds
//! positions.

pub mod model;

pub use model::{ActuatorBank, ActuatorLimits, ActuatorState};
