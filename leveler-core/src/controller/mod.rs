//! Leveling controller
//!
//! Sequences calibration, manual and automatic leveling cycles and
//! emergency stop on top of the state machine.

pub mod command;
pub mod leveling;
pub mod status;

pub use command::Command;
pub use leveling::LevelingController;
pub use status::{CycleResult, StatusSnapshot};
