//! Safety monitoring
//!
//! Rejects unsafe actuator commands and reports faults that hold the
//! platform.

pub mod monitor;

pub use monitor::{SafetyMonitor, SafetyStatus, Verdict};
