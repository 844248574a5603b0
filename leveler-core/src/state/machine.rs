//! State machine definition
//!
//! The controller's lifecycle is a function of the current state and an
//! event. Guards that depend on calibration or sample freshness live in the
//! controller; this table only knows which pairs are legal.

use super::events::Event;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Power-on; neither IMU nor actuators calibrated
    #[default]
    Uncalibrated,
    /// Capturing the IMU zero offset
    CalibratingImu,
    /// Homing actuators one at a time
    CalibratingActuators,
    /// Idle; `enabled` gates motion commands
    Ready { enabled: bool },
    /// One-shot leveling cycle in flight
    ManualLevelInProgress,
    /// Periodic leveling active
    AutoLeveling,
    /// All motion held until reset
    EmergencyStopped,
}

impl State {
    /// Check if this state allows new actuator targets
    pub fn motion_allowed(&self) -> bool {
        matches!(
            self,
            State::Ready { enabled: true } | State::ManualLevelInProgress | State::AutoLeveling
        )
    }

    /// Short lowercase name for status lines
    pub fn name(&self) -> &'static str {
        match self {
            State::Uncalibrated => "uncalibrated",
            State::CalibratingImu => "calibrating IMU",
            State::CalibratingActuators => "calibrating actuators",
            State::Ready { enabled: true } => "ready (enabled)",
            State::Ready { enabled: false } => "ready (disabled)",
            State::ManualLevelInProgress => "leveling",
            State::AutoLeveling => "auto-leveling",
            State::EmergencyStopped => "emergency stopped",
        }
    }

    /// Whether `event` is a legal transition from this state
    pub fn accepts(self, event: Event) -> bool {
        self.transition(event) != self || matches!((self, event), (State::EmergencyStopped, Event::EmergencyStop))
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Emergency stop wins from anywhere
            (_, EmergencyStop) => EmergencyStopped,

            // Calibration may start from idle states only
            (Uncalibrated | Ready { .. }, CalibrateImu) => CalibratingImu,
            (Uncalibrated | Ready { .. }, CalibrateActuators) => CalibratingActuators,
            (CalibratingImu | CalibratingActuators, CalibrationDone { enabled }) => Ready { enabled },
            (CalibratingImu | CalibratingActuators, CalibrationFailed { ready: true }) => Ready { enabled: false },
            (CalibratingImu | CalibratingActuators, CalibrationFailed { ready: false }) => Uncalibrated,

            // Readiness
            (Ready { enabled: false }, Enable) => Ready { enabled: true },
            (Ready { enabled: true }, Disable) => Ready { enabled: false },
            (ManualLevelInProgress | AutoLeveling, Disable) => Ready { enabled: false },

            // Manual leveling
            (Ready { enabled: true }, LevelOnce) => ManualLevelInProgress,
            (ManualLevelInProgress, CycleFinished) => Ready { enabled: true },

            // Auto leveling; cycles run inside the state
            (Ready { enabled: true }, StartAutoLevel) => AutoLeveling,
            (AutoLeveling, StopAutoLevel) => Ready { enabled: true },

            // Reset
            (EmergencyStopped, Reset { calibrated: true }) => Ready { enabled: false },
            (EmergencyStopped, Reset { calibrated: false }) => Uncalibrated,

            // Default: stay in current state
            _ => self,
        }
    }
}
