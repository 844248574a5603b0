//! Error taxonomy for geometry, kinematics and leveling commands
//!
//! Every failure the core can report is a [`LevelError`]. Callers that only
//! need to branch on the category use [`LevelError::kind`]; the `Display`
//! impl gives a human-readable reason for status lines and logs.

use core::fmt;

use crate::state::State;
use crate::traits::TransportError;

/// Category of a [`LevelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Platform geometry is inconsistent
    Geometry,
    /// Requested pose needs an actuator outside its stroke
    UnreachablePose,
    /// Actuator target outside its calibrated travel
    OutOfRange,
    /// Requested lengths imply more tilt than allowed
    TiltLimitExceeded,
    /// An actuator is faulted
    ActuatorFault,
    /// IMU or actuator calibration missing
    NotCalibrated,
    /// No sufficiently recent orientation sample
    StaleOrientation,
    /// Command not valid in the current controller state
    InvalidState,
    /// Actuator transport refused a request
    Transport,
    /// A leveling setting is out of range or not finite
    Config,
}

/// Why a platform geometry failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryFault {
    /// Point lists do not match the variant's actuator count
    PointCountMismatch { expected: u8, base: u8, platform: u8 },
    /// A dimension is zero, negative or not finite
    InvalidDimension,
    /// `min_height` is not below `max_height`
    InvertedHeightRange,
    /// An attachment point is not finite or a leg has zero length
    DegenerateLayout,
    /// Leveling height lies outside the platform's height range
    LevelingHeightOutOfRange,
}

/// Kind of actuator fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultKind {
    /// No feedback within the feedback timeout
    Timeout,
    /// No progress toward the target within the stall timeout
    Stall,
    /// Reported position outside the calibrated travel
    OutOfBounds,
    /// Homing did not reach the minimum limit in time
    HomingTimeout,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FaultKind::Timeout => "feedback timeout",
            FaultKind::Stall => "stalled",
            FaultKind::OutOfBounds => "position out of bounds",
            FaultKind::HomingTimeout => "homing timeout",
        };
        f.write_str(text)
    }
}

/// Errors reported by the kinematics, safety and controller layers
///
/// Lengths are in metres, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LevelError {
    Geometry(GeometryFault),
    UnreachablePose { actuator: u8, extension: f64 },
    OutOfRange { actuator: u8, travel: f64 },
    /// Wrong number of lengths for the actuator bank
    LengthCount { expected: u8, actual: u8 },
    TiltLimitExceeded { tilt: f64, limit: f64 },
    ActuatorFault { actuator: u8, kind: FaultKind },
    NotCalibrated { imu: bool, actuators: bool },
    /// `age_ms` is `None` when no sample has ever arrived
    StaleOrientation { age_ms: Option<u64> },
    InvalidState(State),
    Transport(TransportError),
    /// `field` names the rejected leveling setting
    InvalidConfig { field: &'static str },
}

impl LevelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LevelError::Geometry(_) => ErrorKind::Geometry,
            LevelError::UnreachablePose { .. } => ErrorKind::UnreachablePose,
            LevelError::OutOfRange { .. } | LevelError::LengthCount { .. } => ErrorKind::OutOfRange,
            LevelError::TiltLimitExceeded { .. } => ErrorKind::TiltLimitExceeded,
            LevelError::ActuatorFault { .. } => ErrorKind::ActuatorFault,
            LevelError::NotCalibrated { .. } => ErrorKind::NotCalibrated,
            LevelError::StaleOrientation { .. } => ErrorKind::StaleOrientation,
            LevelError::InvalidState(_) => ErrorKind::InvalidState,
            LevelError::Transport(_) => ErrorKind::Transport,
            LevelError::InvalidConfig { .. } => ErrorKind::Config,
        }
    }
}

impl From<GeometryFault> for LevelError {
    fn from(fault: GeometryFault) -> Self {
        LevelError::Geometry(fault)
    }
}

impl From<TransportError> for LevelError {
    fn from(err: TransportError) -> Self {
        LevelError::Transport(err)
    }
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Geometry(fault) => match fault {
                GeometryFault::PointCountMismatch { expected, base, platform } => write!(
                    f,
                    "geometry: expected {} attachment pairs, got {} base and {} platform points",
                    expected, base, platform
                ),
                GeometryFault::InvalidDimension => f.write_str("geometry: dimensions must be finite and positive"),
                GeometryFault::InvertedHeightRange => f.write_str("geometry: min height must be below max height"),
                GeometryFault::DegenerateLayout => f.write_str("geometry: degenerate attachment layout"),
                GeometryFault::LevelingHeightOutOfRange => {
                    f.write_str("geometry: leveling height outside the platform height range")
                }
            },
            LevelError::UnreachablePose { actuator, extension } => write!(
                f,
                "pose unreachable: actuator {} needs {:.1} mm of extension",
                actuator,
                extension * 1000.0
            ),
            LevelError::OutOfRange { actuator, travel } => write!(
                f,
                "actuator {} target {:.1} mm outside its stroke",
                actuator,
                travel * 1000.0
            ),
            LevelError::LengthCount { expected, actual } => {
                write!(f, "expected {} actuator lengths, got {}", expected, actual)
            }
            LevelError::TiltLimitExceeded { tilt, limit } => write!(
                f,
                "implied tilt {:.2}° exceeds limit {:.2}°",
                tilt.to_degrees(),
                limit.to_degrees()
            ),
            LevelError::ActuatorFault { actuator, kind } => write!(f, "actuator {} fault: {}", actuator, kind),
            LevelError::NotCalibrated { imu, actuators } => match (imu, actuators) {
                (false, false) => f.write_str("IMU and actuators not calibrated"),
                (false, true) => f.write_str("IMU not calibrated"),
                (true, false) => f.write_str("actuators not calibrated"),
                (true, true) => f.write_str("not calibrated"),
            },
            LevelError::StaleOrientation { age_ms } => match age_ms {
                Some(age) => write!(f, "orientation sample is {} ms old", age),
                None => f.write_str("no orientation sample received"),
            },
            LevelError::InvalidState(state) => write!(f, "command not allowed while {}", state.name()),
            LevelError::Transport(err) => write!(f, "actuator transport: {}", err),
            LevelError::InvalidConfig { field } => write!(f, "configuration: {} out of range", field),
        }
    }
}
