//! Events that trigger state transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Calibration events
    /// User requested IMU calibration
    CalibrateImu,
    /// User requested actuator homing
    CalibrateActuators,
    /// Calibration finished; `enabled` is the readiness to resume with
    CalibrationDone { enabled: bool },
    /// Calibration failed; `ready` selects Ready(disabled) over Uncalibrated
    CalibrationFailed { ready: bool },

    // Readiness events
    /// Operator enabled motion
    Enable,
    /// Operator disabled motion
    Disable,

    // Leveling events
    /// One-shot leveling cycle issued
    LevelOnce,
    /// In-flight cycle completed, timed out or failed
    CycleFinished,
    /// Periodic leveling switched on
    StartAutoLevel,
    /// Periodic leveling switched off
    StopAutoLevel,

    // Safety events
    /// Emergency stop requested
    EmergencyStop,
    /// Operator cleared the emergency stop; `calibrated` if anything is
    Reset { calibrated: bool },
}
