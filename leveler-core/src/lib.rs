//! Board-agnostic core logic for the platform leveler
//!
//! This crate contains all leveling logic that does not depend on a
//! specific IMU, actuator link or runtime:
//!
//! - Platform geometry and configuration types
//! - Inverse and forward kinematics for tripod and Stewart platforms
//! - Actuator bank model (targets, feedback, homing, fault detection)
//! - Safety validation of candidate actuator targets
//! - Leveling state machine and controller
//! - Hardware abstraction traits (orientation source, actuator transport)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod actuator;
pub mod config;
pub mod controller;
pub mod error;
pub mod kinematics;
pub mod math;
pub mod safety;
pub mod state;
pub mod traits;

pub use error::{ErrorKind, LevelError};
