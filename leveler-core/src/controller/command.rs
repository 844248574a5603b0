//! Operator commands

/// Commands accepted from a front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    CalibrateImu,
    CalibrateActuators,
    Enable,
    Disable,
    LevelOnce,
    ToggleAutoLevel,
    EmergencyStop,
    Reset,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::CalibrateImu,
        Command::CalibrateActuators,
        Command::Enable,
        Command::Disable,
        Command::LevelOnce,
        Command::ToggleAutoLevel,
        Command::EmergencyStop,
        Command::Reset,
    ];

    /// Canonical command-line spelling
    pub const fn name(&self) -> &'static str {
        match self {
            Command::CalibrateImu => "calibrate-imu",
            Command::CalibrateActuators => "calibrate-actuators",
            Command::Enable => "enable",
            Command::Disable => "disable",
            Command::LevelOnce => "level-once",
            Command::ToggleAutoLevel => "toggle-auto-level",
            Command::EmergencyStop => "emergency-stop",
            Command::Reset => "reset",
        }
    }

    /// Parse a command name; underscores and case are ignored
    pub fn from_name(name: &str) -> Option<Self> {
        let matches = |candidate: &str| {
            candidate.len() == name.len()
                && candidate.bytes().zip(name.bytes()).all(|(c, n)| {
                    let n = if n == b'_' { b'-' } else { n.to_ascii_lowercase() };
                    c == n
                })
        };
        Command::ALL.into_iter().find(|command| matches(command.name()))
    }

    /// Emergency stop is serviced ahead of everything else
    pub const fn is_emergency(&self) -> bool {
        matches!(self, Command::EmergencyStop)
    }
}
