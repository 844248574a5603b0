//! Simulated linear actuator bank
//!
//! Each actuator moves toward its target at a fixed speed, stops at its
//! limit switches and reports its length once per simulation step. The
//! bank implements [`ActuatorTransport`] so the controller can drive it
//! exactly like a real link.
//!
//! # Usage
//!
//! ```ignore
//! let mut bank = SimulatedActuatorBank::from_geometry(&geometry, SimActuatorConfig::default());
//! bank.set_enabled(true);
//! bank.send_targets(&targets)?;
//!
//! // In the simulation loop:
//! bank.step(20);
//! let lengths = bank.physical_lengths();
//! ```

use heapless::Vec;
use leveler_core::config::{PlatformGeometry, MAX_ACTUATORS};
use leveler_core::traits::{ActuatorFeedback, ActuatorTransport, TransportError};

/// Distance from a limit at which the switch reads closed (m)
const LIMIT_SWITCH_BAND: f64 = 1e-6;

/// Simulated actuator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimActuatorConfig {
    /// Travel speed (m/s)
    pub speed: f64,
    /// Constant error added to every reported length (m)
    pub sensor_offset: f64,
}

impl Default for SimActuatorConfig {
    fn default() -> Self {
        Self {
            speed: 0.02,
            sensor_offset: 0.0,
        }
    }
}

/// One simulated actuator
///
/// Lengths are physical leg lengths in metres. Reported lengths carry the
/// configured sensor offset.
#[derive(Debug, Clone)]
pub struct SimActuator {
    config: SimActuatorConfig,
    /// Fully retracted length
    min_length: f64,
    /// Usable travel beyond `min_length`
    stroke: f64,
    /// Current physical length
    position: f64,
    /// Physical length being driven toward
    target: f64,
    /// Driving toward the minimum limit switch
    homing: bool,
    /// Mechanically jammed; commands are accepted but nothing moves
    stalled: bool,
    /// Reports feedback; a silent actuator still moves
    reporting: bool,
    /// A step happened since the last report
    report_pending: bool,
}

impl SimActuator {
    /// Create an actuator resting fully retracted
    pub fn new(config: SimActuatorConfig, min_length: f64, stroke: f64) -> Self {
        Self {
            config,
            min_length,
            stroke,
            position: min_length,
            target: min_length,
            homing: false,
            stalled: false,
            reporting: true,
            report_pending: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_homing(&self) -> bool {
        self.homing
    }

    pub fn max_length(&self) -> f64 {
        self.min_length + self.stroke
    }

    pub fn at_min_limit(&self) -> bool {
        self.position <= self.min_length + LIMIT_SWITCH_BAND
    }

    pub fn at_max_limit(&self) -> bool {
        self.position >= self.max_length() - LIMIT_SWITCH_BAND
    }

    /// Place the actuator at a physical length, clamped to its travel
    pub fn place(&mut self, length: f64) {
        self.position = length.clamp(self.min_length, self.max_length());
        self.target = self.position;
    }

    /// Set a target given in the reported frame
    pub fn command(&mut self, reported_length: f64) {
        self.homing = false;
        self.target = reported_length - self.config.sensor_offset;
    }

    pub fn home(&mut self) {
        self.homing = true;
    }

    /// Stop where it is
    pub fn halt(&mut self) {
        self.homing = false;
        self.target = self.position;
    }

    /// Advance the actuator by `delta_ms`
    ///
    /// Homing runs regardless of `enabled`; ordinary moves need it.
    pub fn update_with_delta(&mut self, delta_ms: u32, enabled: bool) {
        self.report_pending = true;
        if self.stalled {
            return;
        }

        let goal = if self.homing {
            self.min_length
        } else if enabled {
            self.target
        } else {
            return;
        };

        let max_step = self.config.speed * delta_ms as f64 / 1000.0;
        let error = goal - self.position;
        let step = error.clamp(-max_step, max_step);
        self.position = (self.position + step).clamp(self.min_length, self.max_length());

        if self.homing && self.at_min_limit() {
            self.homing = false;
            self.target = self.position;
        }
    }

    /// Take the pending report, if any
    pub fn report(&mut self) -> Option<ActuatorFeedback> {
        if !self.reporting || !self.report_pending {
            return None;
        }
        self.report_pending = false;
        Some(ActuatorFeedback {
            current_length: self.position + self.config.sensor_offset,
            at_min_limit: self.at_min_limit(),
            at_max_limit: self.at_max_limit(),
        })
    }
}

/// Bank of simulated actuators behind one simulated link
#[derive(Debug, Clone)]
pub struct SimulatedActuatorBank {
    actuators: Vec<SimActuator, MAX_ACTUATORS>,
    enabled: bool,
    link_up: bool,
}

impl SimulatedActuatorBank {
    /// Create a bank with one actuator per retracted length
    ///
    /// Lengths beyond [`MAX_ACTUATORS`] are ignored.
    pub fn new(config: SimActuatorConfig, retracted: &[f64], stroke: f64) -> Self {
        let mut actuators = Vec::new();
        for &min_length in retracted.iter().take(MAX_ACTUATORS) {
            let _ = actuators.push(SimActuator::new(config, min_length, stroke));
        }
        Self {
            actuators,
            enabled: false,
            link_up: true,
        }
    }

    /// Create a bank matching a platform's legs
    pub fn from_geometry(geometry: &PlatformGeometry, config: SimActuatorConfig) -> Self {
        Self::new(config, geometry.retracted_lengths(), geometry.actuator_stroke())
    }

    pub fn actuator(&self, index: usize) -> Option<&SimActuator> {
        self.actuators.get(index)
    }

    pub fn actuator_mut(&mut self, index: usize) -> Option<&mut SimActuator> {
        self.actuators.get_mut(index)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current physical leg lengths
    pub fn physical_lengths(&self) -> Vec<f64, MAX_ACTUATORS> {
        self.actuators.iter().map(SimActuator::position).collect()
    }

    /// Whether every actuator has reached its target
    pub fn is_idle(&self, tolerance: f64) -> bool {
        self.actuators
            .iter()
            .all(|a| !a.homing && libm::fabs(a.target - a.position) <= tolerance)
    }

    /// Advance every actuator by `delta_ms`
    pub fn step(&mut self, delta_ms: u32) {
        let enabled = self.enabled;
        for actuator in self.actuators.iter_mut() {
            actuator.update_with_delta(delta_ms, enabled);
        }
    }

    /// Jam or free one actuator
    pub fn inject_stall(&mut self, index: usize, stalled: bool) {
        if let Some(actuator) = self.actuators.get_mut(index) {
            actuator.stalled = stalled;
        }
    }

    /// Stop or resume feedback from one actuator
    pub fn set_reporting(&mut self, index: usize, reporting: bool) {
        if let Some(actuator) = self.actuators.get_mut(index) {
            actuator.reporting = reporting;
        }
    }

    /// Take the whole link down or bring it back
    ///
    /// While down, commands fail and no feedback arrives; the actuators keep
    /// their last targets.
    pub fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }
}

impl ActuatorTransport for SimulatedActuatorBank {
    fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    fn send_targets(&mut self, targets: &[f64]) -> Result<(), TransportError> {
        if !self.link_up {
            return Err(TransportError::Disconnected);
        }
        if targets.len() != self.actuators.len() || targets.iter().any(|t| !t.is_finite()) {
            return Err(TransportError::Rejected);
        }
        for (actuator, &target) in self.actuators.iter_mut().zip(targets) {
            actuator.command(target);
        }
        Ok(())
    }

    fn home(&mut self, index: usize) -> Result<(), TransportError> {
        if !self.link_up {
            return Err(TransportError::Disconnected);
        }
        let actuator = self.actuators.get_mut(index).ok_or(TransportError::InvalidIndex)?;
        actuator.home();
        Ok(())
    }

    fn halt(&mut self, index: usize) {
        if let Some(actuator) = self.actuators.get_mut(index) {
            actuator.halt();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn feedback(&mut self, index: usize) -> Option<ActuatorFeedback> {
        if !self.link_up {
            return None;
        }
        self.actuators.get_mut(index)?.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> SimulatedActuatorBank {
        SimulatedActuatorBank::new(SimActuatorConfig::default(), &[0.3, 0.3, 0.3], 0.4)
    }

    #[test]
    fn test_starts_retracted_with_min_switch_closed() {
        let mut bank = bank();
        assert_eq!(bank.actuator_count(), 3);
        // Nothing to report before the first step
        assert!(bank.feedback(0).is_none());

        bank.step(20);
        let report = bank.feedback(0).unwrap();
        assert_eq!(report.current_length, 0.3);
        assert!(report.at_min_limit);
        assert!(!report.at_max_limit);
        assert!(bank.feedback(0).is_none());
    }

    #[test]
    fn test_moves_at_configured_speed() {
        let mut bank = bank();
        bank.set_enabled(true);
        bank.send_targets(&[0.4, 0.35, 0.3]).unwrap();

        bank.step(1000);
        let lengths = bank.physical_lengths();
        assert!((lengths[0] - 0.32).abs() < 1e-12);
        assert!((lengths[1] - 0.32).abs() < 1e-12);
        assert_eq!(lengths[2], 0.3);

        for _ in 0..10 {
            bank.step(1000);
        }
        assert!(bank.is_idle(1e-9));
        assert!((bank.physical_lengths()[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_disabled_bank_holds_position() {
        let mut bank = bank();
        bank.send_targets(&[0.5, 0.5, 0.5]).unwrap();
        bank.step(1000);
        assert_eq!(bank.physical_lengths()[0], 0.3);
    }

    #[test]
    fn test_travel_clamped_at_max_limit() {
        let mut bank = bank();
        bank.set_enabled(true);
        bank.send_targets(&[0.9, 0.3, 0.3]).unwrap();
        for _ in 0..30 {
            bank.step(1000);
        }
        let report = bank.feedback(0).unwrap();
        assert!((report.current_length - 0.7).abs() < 1e-12);
        assert!(report.at_max_limit);
    }

    #[test]
    fn test_homing_runs_while_disabled() {
        let mut bank = bank();
        bank.actuator_mut(1).unwrap().place(0.5);
        bank.home(1).unwrap();
        assert!(bank.actuator(1).unwrap().is_homing());

        for _ in 0..15 {
            bank.step(1000);
        }
        let actuator = bank.actuator(1).unwrap();
        assert!(!actuator.is_homing());
        assert!(actuator.at_min_limit());
    }

    #[test]
    fn test_sensor_offset_applies_to_reports_and_commands() {
        let config = SimActuatorConfig {
            sensor_offset: 0.01,
            ..SimActuatorConfig::default()
        };
        let mut bank = SimulatedActuatorBank::new(config, &[0.3], 0.4);
        bank.set_enabled(true);
        bank.step(20);
        assert!((bank.feedback(0).unwrap().current_length - 0.31).abs() < 1e-12);

        bank.send_targets(&[0.41]).unwrap();
        for _ in 0..10 {
            bank.step(1000);
        }
        assert!((bank.physical_lengths()[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_stalled_actuator_keeps_reporting() {
        let mut bank = bank();
        bank.set_enabled(true);
        bank.inject_stall(2, true);
        bank.send_targets(&[0.4, 0.4, 0.4]).unwrap();
        bank.step(1000);

        assert_eq!(bank.physical_lengths()[2], 0.3);
        assert!(bank.feedback(2).is_some());
    }

    #[test]
    fn test_link_down_rejects_commands_and_silences_feedback() {
        let mut bank = bank();
        bank.set_link_up(false);
        assert_eq!(bank.send_targets(&[0.4, 0.4, 0.4]), Err(TransportError::Disconnected));
        assert_eq!(bank.home(0), Err(TransportError::Disconnected));
        bank.step(20);
        assert!(bank.feedback(0).is_none());

        bank.set_link_up(true);
        assert!(bank.feedback(0).is_some());
    }

    #[test]
    fn test_invalid_requests() {
        let mut bank = bank();
        assert_eq!(bank.send_targets(&[0.4, 0.4]), Err(TransportError::Rejected));
        assert_eq!(bank.send_targets(&[0.4, f64::NAN, 0.4]), Err(TransportError::Rejected));
        assert_eq!(bank.home(7), Err(TransportError::InvalidIndex));
    }

    #[test]
    fn test_halt_freezes_target() {
        let mut bank = bank();
        bank.set_enabled(true);
        bank.send_targets(&[0.5, 0.5, 0.5]).unwrap();
        bank.step(500);
        bank.halt_all();
        let held = bank.physical_lengths();
        bank.step(1000);
        assert_eq!(bank.physical_lengths(), held);
    }
}
