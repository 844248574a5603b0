//! Safety monitor implementation
//!
//! Validates candidate actuator targets before they reach the transport and
//! reports actuator faults that must hold the platform.

use heapless::Vec;

use crate::actuator::ActuatorState;
use crate::config::{LevelingConfig, PlatformGeometry, MAX_ACTUATORS};
use crate::error::{FaultKind, LevelError};
use crate::kinematics::{estimate_pose, solver::RANGE_EPSILON};
use crate::math::tilt_magnitude;

/// Outcome of validating a candidate command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Verdict {
    pub accepted: bool,
    pub reason: Option<LevelError>,
}

impl Verdict {
    pub const fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub const fn reject(reason: LevelError) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), LevelError> {
        match self.reason {
            Some(reason) if !self.accepted => Err(reason),
            _ => Ok(()),
        }
    }
}

/// Actuator health as seen by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All actuators healthy
    Ok,
    /// An actuator is faulted; motion must be held
    Fault { actuator: u8, kind: FaultKind },
}

/// Stateless validation against configured limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyMonitor {
    /// Largest accepted platform tilt (radians)
    max_tilt: f64,
    /// Actuator stroke (m)
    stroke: f64,
}

impl SafetyMonitor {
    /// Create a monitor
    ///
    /// # Arguments
    /// - `max_tilt`: Largest accepted tilt in radians
    /// - `stroke`: Usable actuator travel in metres
    pub const fn new(max_tilt: f64, stroke: f64) -> Self {
        Self { max_tilt, stroke }
    }

    pub fn from_config(geometry: &PlatformGeometry, config: &LevelingConfig) -> Self {
        Self::new(config.max_tilt_compensation.to_radians(), geometry.actuator_stroke())
    }

    pub fn max_tilt(&self) -> f64 {
        self.max_tilt
    }

    /// Validate transport-frame targets before they are issued
    ///
    /// Checks, in order: actuator faults, target count, stroke range
    /// relative to each zero offset, and the tilt the targets would produce.
    pub fn validate(&self, requested: &[f64], actuators: &[ActuatorState], geometry: &PlatformGeometry) -> Verdict {
        if let SafetyStatus::Fault { actuator, kind } = self.check_actuators(actuators) {
            return Verdict::reject(LevelError::ActuatorFault { actuator, kind });
        }

        if requested.len() != actuators.len() || requested.len() != geometry.actuator_count() {
            return Verdict::reject(LevelError::LengthCount {
                expected: geometry.actuator_count() as u8,
                actual: requested.len().min(u8::MAX as usize) as u8,
            });
        }

        // Stroke range relative to the homed position
        let mut legs: Vec<f64, MAX_ACTUATORS> = Vec::new();
        for ((state, &target), &retracted) in actuators.iter().zip(requested).zip(geometry.retracted_lengths()) {
            let travel = target - state.zero_offset;
            if !travel.is_finite() || travel < -RANGE_EPSILON || travel > self.stroke + RANGE_EPSILON {
                return Verdict::reject(LevelError::OutOfRange {
                    actuator: state.index,
                    travel,
                });
            }
            let _ = legs.push(retracted + travel);
        }

        // Tilt implied by the requested lengths
        match estimate_pose(geometry, &legs) {
            Ok(estimate) => {
                let tilt = estimate.tilt();
                if tilt > self.max_tilt {
                    return Verdict::reject(LevelError::TiltLimitExceeded {
                        tilt,
                        limit: self.max_tilt,
                    });
                }
            }
            Err(err) => return Verdict::reject(err),
        }

        Verdict::accept()
    }

    /// Validate a requested roll/pitch attitude
    pub fn check_tilt_request(&self, roll: f64, pitch: f64) -> Verdict {
        let tilt = tilt_magnitude(roll, pitch);
        if !tilt.is_finite() || tilt > self.max_tilt {
            return Verdict::reject(LevelError::TiltLimitExceeded {
                tilt,
                limit: self.max_tilt,
            });
        }
        Verdict::accept()
    }

    /// Check actuator health
    ///
    /// Returns the first fault detected, or Ok if every actuator is healthy.
    pub fn check_actuators(&self, actuators: &[ActuatorState]) -> SafetyStatus {
        actuators
            .iter()
            .find(|s| s.fault)
            .map_or(SafetyStatus::Ok, |s| SafetyStatus::Fault {
                actuator: s.index,
                kind: s.fault_kind.unwrap_or(FaultKind::Timeout),
            })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlatformConfig, PlatformVariant};
    use crate::error::ErrorKind;
    use crate::kinematics::solve;
    use crate::math::Vec3;
    use crate::traits::Orientation;

    fn geometry(variant: PlatformVariant) -> PlatformGeometry {
        PlatformGeometry::from_config(&PlatformConfig::for_variant(variant)).unwrap()
    }

    /// Homed actuators whose zero offset equals the retracted length
    fn homed(geometry: &PlatformGeometry) -> std::vec::Vec<ActuatorState> {
        geometry
            .retracted_lengths()
            .iter()
            .enumerate()
            .map(|(i, &r)| ActuatorState {
                current_length: r,
                target_length: r,
                zero_offset: r,
                homed: true,
                ..ActuatorState::new(i as u8)
            })
            .collect()
    }

    fn monitor() -> SafetyMonitor {
        SafetyMonitor::new(15.0_f64.to_radians(), 0.4)
    }

    #[test]
    fn test_accepts_moderate_tilt() {
        let g = geometry(PlatformVariant::Tripod);
        let lengths = solve(&g, &Orientation::from_degrees(4.0, -3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.2)).unwrap();
        let verdict = monitor().validate(&lengths, &homed(&g), &g);
        assert!(verdict.accepted);
        assert!(verdict.into_result().is_ok());
    }

    #[test]
    fn test_rejects_excess_tilt() {
        let g = geometry(PlatformVariant::Stewart3Dof);
        let strict = SafetyMonitor::new(2.0_f64.to_radians(), 0.4);
        let lengths = solve(&g, &Orientation::from_degrees(4.0, 0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.2)).unwrap();

        let verdict = strict.validate(&lengths, &homed(&g), &g);
        assert!(!verdict.accepted);
        let reason = verdict.reason.unwrap();
        assert_eq!(reason.kind(), ErrorKind::TiltLimitExceeded);
        if let LevelError::TiltLimitExceeded { tilt, .. } = reason {
            assert!((tilt.to_degrees() - 4.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        let g = geometry(PlatformVariant::Tripod);
        let verdict = monitor().validate(&[0.5, 0.75, 0.5], &homed(&g), &g);
        assert_eq!(verdict.reason.unwrap().kind(), ErrorKind::OutOfRange);

        let verdict = monitor().validate(&[0.5, 0.5], &homed(&g), &g);
        assert_eq!(
            verdict.reason,
            Some(LevelError::LengthCount { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_rejects_when_any_actuator_faulted() {
        let g = geometry(PlatformVariant::Tripod);
        let mut actuators = homed(&g);
        actuators[2].fault = true;
        actuators[2].fault_kind = Some(FaultKind::Stall);

        let verdict = monitor().validate(&[0.5, 0.5, 0.5], &actuators, &g);
        assert_eq!(
            verdict.reason,
            Some(LevelError::ActuatorFault {
                actuator: 2,
                kind: FaultKind::Stall
            })
        );
        assert_eq!(
            monitor().check_actuators(&actuators),
            SafetyStatus::Fault {
                actuator: 2,
                kind: FaultKind::Stall
            }
        );
    }

    #[test]
    fn test_tilt_request_bounds() {
        assert!(monitor().check_tilt_request(0.1, 0.1).accepted);
        assert!(!monitor().check_tilt_request(0.3, 0.0).accepted);
    }

}
