//! Status snapshots and cycle outcomes

use core::fmt;

use heapless::Vec;

use crate::actuator::ActuatorState;
use crate::config::MAX_ACTUATORS;
use crate::error::LevelError;
use crate::state::State;
use crate::traits::Orientation;

/// Outcome of the most recent leveling cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleResult {
    /// Every actuator reached its target
    Success,
    /// Motion ended early at a limit switch; the pose reached falls short
    LimitReached { actuator: u8 },
    /// Tilt already below the level threshold; nothing moved
    AlreadyLevel,
    /// Targets not reached before the actuator timeout
    TimedOut,
    /// An actuator faulted mid-cycle
    Failed(LevelError),
    /// Command refused before any motion
    Rejected(LevelError),
    /// Cancelled by emergency stop or disable
    Aborted,
}

impl CycleResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleResult::Success | CycleResult::AlreadyLevel)
    }
}

impl fmt::Display for CycleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleResult::Success => f.write_str("success"),
            CycleResult::LimitReached { actuator } => write!(f, "actuator {} stopped at its limit", actuator),
            CycleResult::AlreadyLevel => f.write_str("already level"),
            CycleResult::TimedOut => f.write_str("timed out"),
            CycleResult::Failed(err) => write!(f, "failed: {}", err),
            CycleResult::Rejected(err) => write!(f, "rejected: {}", err),
            CycleResult::Aborted => f.write_str("aborted"),
        }
    }
}

/// Owned copy of everything a front end shows
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub state: State,
    /// Latest sample with the IMU zero offset removed
    pub orientation: Option<Orientation>,
    /// Tilt magnitude of `orientation` (radians)
    pub tilt: Option<f64>,
    /// Roll/pitch currently commanded relative to the base
    pub commanded: Orientation,
    pub actuators: Vec<ActuatorState, MAX_ACTUATORS>,
    pub auto_level_enabled: bool,
    pub orientation_stale: bool,
    pub last_cycle: Option<CycleResult>,
    pub imu_calibrated: bool,
    pub actuators_calibrated: bool,
    /// Control clock at the last tick
    pub timestamp_ms: u64,
}

impl StatusSnapshot {
    pub fn any_fault(&self) -> bool {
        self.actuators.iter().any(|a| a.fault)
    }

    /// Tilt in degrees, if a sample is available
    pub fn tilt_degrees(&self) -> Option<f64> {
        self.tilt.map(f64::to_degrees)
    }
}
