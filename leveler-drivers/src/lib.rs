//! Driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in leveler-core:
//!
//! - Actuators (simulated linear actuator bank with limit switches)
//! - Sensors (simulated tilt sensor driven by actuator lengths)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod actuator;
pub mod sensor;
