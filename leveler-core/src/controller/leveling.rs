//! Leveling controller coordinating state machine, kinematics and safety
//!
//! The controller is the single owner of the actuator bank. It:
//! - Runs calibration (IMU zero offset, actuator homing)
//! - Turns orientation samples into correction poses
//! - Validates every command set before it is issued
//! - Tracks the in-flight cycle until it settles, times out or faults
//! - Produces status snapshots for front ends
//!
//! Nothing here blocks. The runtime calls [`LevelingController::tick`] on a
//! fixed interval with its clock in milliseconds; commands complete across
//! ticks.

use crate::actuator::{ActuatorBank, ActuatorLimits};
use crate::config::{LevelingConfig, PlatformGeometry};
use crate::error::{GeometryFault, LevelError};
use crate::kinematics;
use crate::math::Vec3;
use crate::safety::{SafetyMonitor, SafetyStatus};
use crate::state::{Event, State};
use crate::traits::{ActuatorTransport, Orientation};

use super::command::Command;
use super::status::{CycleResult, StatusSnapshot};

/// Command set currently in flight
#[derive(Debug, Clone, Copy)]
struct ActiveCycle {
    started_ms: u64,
    auto: bool,
}

/// Leveling controller
pub struct LevelingController<T: ActuatorTransport> {
    /// Current lifecycle state
    state: State,
    geometry: PlatformGeometry,
    config: LevelingConfig,
    safety: SafetyMonitor,
    actuators: ActuatorBank<T>,
    /// Platform height above neutral held while leveling (m)
    leveling_height: f64,
    /// Roll/pitch bias captured at IMU calibration
    imu_offset: (f64, f64),
    imu_calibrated: bool,
    actuators_calibrated: bool,
    auto_level_enabled: bool,
    orientation_stale: bool,
    /// Latest raw sample
    latest: Option<Orientation>,
    /// Attitude currently commanded relative to the base
    commanded: Orientation,
    cycle: Option<ActiveCycle>,
    /// Actuator being homed during actuator calibration
    homing_index: Option<usize>,
    /// Whether actuator calibration started from a ready state
    homing_from_ready: bool,
    last_cycle: Option<CycleResult>,
    /// Time the last cycle ended; auto-level ignores older samples
    settled_at_ms: u64,
    /// Last tick timestamp (ms)
    last_tick_ms: u64,
}

impl<T: ActuatorTransport> LevelingController<T> {
    /// Create a controller for a platform
    ///
    /// Fails if a leveling setting is out of range, the transport's actuator
    /// count does not match the geometry, or the leveling height lies outside
    /// the platform's height range.
    pub fn new(geometry: PlatformGeometry, config: LevelingConfig, transport: T) -> Result<Self, LevelError> {
        config.validate()?;
        if transport.actuator_count() != geometry.actuator_count() {
            return Err(LevelError::LengthCount {
                expected: geometry.actuator_count() as u8,
                actual: transport.actuator_count().min(u8::MAX as usize) as u8,
            });
        }

        let leveling_height = config.leveling_height.unwrap_or(geometry.height_range() / 2.0);
        if !leveling_height.is_finite()
            || leveling_height < 0.0
            || leveling_height > geometry.height_range()
            || leveling_height > geometry.actuator_stroke()
        {
            return Err(GeometryFault::LevelingHeightOutOfRange.into());
        }

        let limits = ActuatorLimits::new(&geometry, &config);
        Ok(Self {
            state: State::Uncalibrated,
            safety: SafetyMonitor::from_config(&geometry, &config),
            actuators: ActuatorBank::new(transport, limits),
            geometry,
            config,
            leveling_height,
            imu_offset: (0.0, 0.0),
            imu_calibrated: false,
            actuators_calibrated: false,
            auto_level_enabled: false,
            orientation_stale: true,
            latest: None,
            commanded: Orientation::default(),
            cycle: None,
            homing_index: None,
            homing_from_ready: false,
            last_cycle: None,
            settled_at_ms: 0,
            last_tick_ms: 0,
        })
    }

    /// Get current state
    pub fn state(&self) -> State {
        self.state
    }

    pub fn geometry(&self) -> &PlatformGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &LevelingConfig {
        &self.config
    }

    pub fn actuators(&self) -> &ActuatorBank<T> {
        &self.actuators
    }

    /// Direct transport access, for simulation and tests
    pub fn transport_mut(&mut self) -> &mut T {
        self.actuators.transport_mut()
    }

    pub fn leveling_height(&self) -> f64 {
        self.leveling_height
    }

    pub fn commanded(&self) -> Orientation {
        self.commanded
    }

    pub fn imu_offset(&self) -> (f64, f64) {
        self.imu_offset
    }

    pub fn last_cycle(&self) -> Option<CycleResult> {
        self.last_cycle
    }

    pub fn is_auto_level_enabled(&self) -> bool {
        self.auto_level_enabled
    }

    pub fn is_fully_calibrated(&self) -> bool {
        self.imu_calibrated && self.actuators_calibrated
    }

    /// Store the newest orientation sample
    pub fn update_orientation(&mut self, sample: Orientation) {
        self.latest = Some(sample);
    }

    /// Latest sample with the IMU offset removed
    pub fn corrected_orientation(&self) -> Option<Orientation> {
        self.latest.map(|s| s.corrected(self.imu_offset.0, self.imu_offset.1))
    }

    /// Dispatch an operator command
    pub fn execute(&mut self, command: Command, now_ms: u64) -> Result<(), LevelError> {
        match command {
            Command::CalibrateImu => self.calibrate_imu(now_ms),
            Command::CalibrateActuators => self.calibrate_actuators(now_ms),
            Command::Enable => self.enable(),
            Command::Disable => self.disable(now_ms),
            Command::LevelOnce => self.level_once(now_ms),
            Command::ToggleAutoLevel => self.toggle_auto_level(now_ms).map(|_| ()),
            Command::EmergencyStop => {
                self.emergency_stop(now_ms);
                Ok(())
            }
            Command::Reset => self.reset(),
        }
    }

    /// Capture the current attitude as the IMU zero offset
    ///
    /// The platform is assumed to be physically level. Needs a fresh sample.
    pub fn calibrate_imu(&mut self, now_ms: u64) -> Result<(), LevelError> {
        if !self.state.accepts(Event::CalibrateImu) {
            return Err(LevelError::InvalidState(self.state));
        }
        let from_ready = matches!(self.state, State::Ready { .. });
        let resume_enabled = self.state == State::Ready { enabled: true };

        self.transition(Event::CalibrateImu);
        match self.fresh_sample(now_ms) {
            Ok(sample) => {
                self.imu_offset = (sample.roll, sample.pitch);
                self.imu_calibrated = true;
                self.transition(Event::CalibrationDone {
                    enabled: resume_enabled,
                });
                Ok(())
            }
            Err(err) => {
                self.transition(Event::CalibrationFailed { ready: from_ready });
                Err(err)
            }
        }
    }

    /// Start homing every actuator in turn
    ///
    /// Completes across subsequent ticks; the controller stays in
    /// `CalibratingActuators` until the last actuator is homed or one fails.
    pub fn calibrate_actuators(&mut self, now_ms: u64) -> Result<(), LevelError> {
        if !self.state.accepts(Event::CalibrateActuators) {
            return Err(LevelError::InvalidState(self.state));
        }
        self.homing_from_ready = matches!(self.state, State::Ready { .. });

        self.transition(Event::CalibrateActuators);
        self.actuators_calibrated = false;
        self.actuators.invalidate_calibration();
        self.actuators.clear_faults();
        self.commanded = Orientation::default();

        if let Err(err) = self.actuators.home(0, now_ms) {
            self.transition(Event::CalibrationFailed {
                ready: self.homing_from_ready,
            });
            return Err(err);
        }
        self.homing_index = Some(0);
        Ok(())
    }

    /// Allow motion; both calibrations must have completed
    pub fn enable(&mut self) -> Result<(), LevelError> {
        match self.state {
            State::Ready { enabled: true } => Ok(()),
            _ if !self.is_fully_calibrated() => Err(LevelError::NotCalibrated {
                imu: self.imu_calibrated,
                actuators: self.actuators_calibrated,
            }),
            State::Ready { enabled: false } => {
                self.transition(Event::Enable);
                Ok(())
            }
            other => Err(LevelError::InvalidState(other)),
        }
    }

    /// Stop motion; cancels auto-leveling and any cycle in flight
    pub fn disable(&mut self, now_ms: u64) -> Result<(), LevelError> {
        match self.state {
            State::Ready { enabled: false } => Ok(()),
            State::Ready { enabled: true } | State::ManualLevelInProgress | State::AutoLeveling => {
                self.abort_cycle(now_ms);
                self.auto_level_enabled = false;
                self.transition(Event::Disable);
                Ok(())
            }
            other => Err(LevelError::InvalidState(other)),
        }
    }

    /// Run one leveling cycle
    ///
    /// Rejections (stale sample, unreachable pose, safety) are returned and
    /// recorded as the last cycle result; nothing moves.
    pub fn level_once(&mut self, now_ms: u64) -> Result<(), LevelError> {
        if self.state != (State::Ready { enabled: true }) {
            return Err(self.not_ready_error());
        }

        match self.start_cycle(now_ms, false) {
            Ok(true) => {
                self.transition(Event::LevelOnce);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(err) => {
                self.last_cycle = Some(CycleResult::Rejected(err));
                Err(err)
            }
        }
    }

    /// Switch periodic leveling on or off
    ///
    /// Returns whether auto-leveling is now enabled.
    pub fn toggle_auto_level(&mut self, now_ms: u64) -> Result<bool, LevelError> {
        match self.state {
            State::Ready { enabled: true } => {
                self.auto_level_enabled = true;
                self.transition(Event::StartAutoLevel);
                Ok(true)
            }
            State::AutoLeveling => {
                self.abort_cycle(now_ms);
                self.auto_level_enabled = false;
                self.transition(Event::StopAutoLevel);
                Ok(false)
            }
            _ => Err(self.not_ready_error()),
        }
    }

    /// Hold every actuator where it is and latch the emergency stop
    pub fn emergency_stop(&mut self, now_ms: u64) -> Event {
        self.abort_cycle(now_ms);
        self.homing_index = None;
        self.actuators.hold_all();
        self.auto_level_enabled = false;
        self.transition(Event::EmergencyStop)
    }

    /// Clear an emergency stop
    ///
    /// A latched actuator fault invalidates actuator calibration.
    pub fn reset(&mut self) -> Result<(), LevelError> {
        if self.state != State::EmergencyStopped {
            return Err(LevelError::InvalidState(self.state));
        }
        if self.actuators.any_fault() {
            self.actuators_calibrated = false;
            self.actuators.invalidate_calibration();
        }
        let calibrated = self.imu_calibrated || self.actuators_calibrated;
        self.transition(Event::Reset { calibrated });
        Ok(())
    }

    /// Periodic tick update
    ///
    /// Call this regularly (every `control_tick_interval`) with the current
    /// timestamp. Returns an event if the state changed.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        self.last_tick_ms = now_ms;
        self.orientation_stale = self.fresh_sample(now_ms).is_err();
        self.actuators.poll_feedback(now_ms);

        match self.state {
            State::CalibratingActuators => self.advance_homing(now_ms),
            State::ManualLevelInProgress => self.advance_cycle(now_ms),
            State::AutoLeveling if self.cycle.is_some() => self.advance_cycle(now_ms),
            State::AutoLeveling => self.auto_level_tick(now_ms),
            _ => None,
        }
    }

    /// Owned copy of the controller's observable state
    pub fn status(&self) -> StatusSnapshot {
        let orientation = self.corrected_orientation();
        StatusSnapshot {
            state: self.state,
            orientation,
            tilt: orientation.map(|o| o.tilt()),
            commanded: self.commanded,
            actuators: self.actuators.snapshot(),
            auto_level_enabled: self.auto_level_enabled,
            orientation_stale: self.orientation_stale,
            last_cycle: self.last_cycle,
            imu_calibrated: self.imu_calibrated,
            actuators_calibrated: self.actuators_calibrated,
            timestamp_ms: self.last_tick_ms,
        }
    }

    /// Compute, validate and issue one correction
    ///
    /// Returns `Ok(false)` when a manual cycle finds the platform already
    /// level.
    fn start_cycle(&mut self, now_ms: u64, auto: bool) -> Result<bool, LevelError> {
        let sample = self.fresh_sample(now_ms)?;
        let residual = sample.corrected(self.imu_offset.0, self.imu_offset.1);

        if !auto && residual.tilt() < self.config.level_threshold.to_radians() {
            self.last_cycle = Some(CycleResult::AlreadyLevel);
            return Ok(false);
        }

        // New pose = commanded pose minus residual, one bounded step at a time
        let step = self.config.max_correction_step.to_radians();
        let roll = self.commanded.roll - residual.roll.clamp(-step, step);
        let pitch = self.commanded.pitch - residual.pitch.clamp(-step, step);
        self.safety.check_tilt_request(roll, pitch).into_result()?;

        let desired = Orientation::attitude(roll, pitch);
        let lengths = kinematics::solve(&self.geometry, &desired, Vec3::new(0.0, 0.0, self.leveling_height))?;
        let targets = self.actuators.leg_lengths_to_targets(&self.geometry, &lengths);

        self.safety
            .validate(&targets, self.actuators.states(), &self.geometry)
            .into_result()?;
        self.actuators.set_targets(&targets, now_ms)?;

        self.commanded = desired;
        self.cycle = Some(ActiveCycle {
            started_ms: now_ms,
            auto,
        });
        Ok(true)
    }

    /// Check the in-flight cycle for completion, fault or timeout
    fn advance_cycle(&mut self, now_ms: u64) -> Option<Event> {
        let cycle = self.cycle?;

        let result = if let SafetyStatus::Fault { actuator, kind } = self.safety.check_actuators(self.actuators.states()) {
            // Faulted actuator is already halted; hold the rest
            self.actuators.hold_all();
            CycleResult::Failed(LevelError::ActuatorFault { actuator, kind })
        } else if self.actuators.is_at_target(self.config.feedback_tolerance) {
            match self.actuators.limit_stop() {
                Some(actuator) => CycleResult::LimitReached { actuator },
                None => CycleResult::Success,
            }
        } else if now_ms.saturating_sub(cycle.started_ms) > self.config.actuator_timeout as u64 {
            self.actuators.hold_all();
            CycleResult::TimedOut
        } else {
            return None;
        };

        if !result.is_success() {
            self.resync_commanded();
        }
        self.cycle = None;
        self.last_cycle = Some(result);
        self.settled_at_ms = now_ms;

        if !cycle.auto {
            return Some(self.transition(Event::CycleFinished));
        }
        if let CycleResult::Failed(_) = result {
            self.auto_level_enabled = false;
            return Some(self.transition(Event::StopAutoLevel));
        }
        None
    }

    /// Auto-level: correct when tilt leaves the deadband
    fn auto_level_tick(&mut self, now_ms: u64) -> Option<Event> {
        if let SafetyStatus::Fault { actuator, kind } = self.safety.check_actuators(self.actuators.states()) {
            self.last_cycle = Some(CycleResult::Rejected(LevelError::ActuatorFault { actuator, kind }));
            self.auto_level_enabled = false;
            return Some(self.transition(Event::StopAutoLevel));
        }
        if self.orientation_stale {
            return None;
        }

        let sample = self.latest?;
        // Only react to samples taken after the platform settled
        if sample.timestamp * 1000.0 < self.settled_at_ms as f64 {
            return None;
        }
        let residual = sample.corrected(self.imu_offset.0, self.imu_offset.1);
        if residual.tilt() <= self.config.auto_level_deadband.to_radians() {
            return None;
        }

        if let Err(err) = self.start_cycle(now_ms, true) {
            self.last_cycle = Some(CycleResult::Rejected(err));
        }
        None
    }

    /// Advance sequential homing after a feedback poll
    fn advance_homing(&mut self, now_ms: u64) -> Option<Event> {
        let index = self.homing_index?;
        if self.actuators.homing_in_progress().is_some() {
            return None;
        }

        if !self.actuators.homing_complete(index) {
            self.homing_index = None;
            return Some(self.transition(Event::CalibrationFailed {
                ready: self.homing_from_ready,
            }));
        }

        let next = index + 1;
        if next < self.actuators.len() {
            if self.actuators.home(next, now_ms).is_err() {
                self.homing_index = None;
                return Some(self.transition(Event::CalibrationFailed {
                    ready: self.homing_from_ready,
                }));
            }
            self.homing_index = Some(next);
            return None;
        }

        self.homing_index = None;
        self.actuators_calibrated = true;
        Some(self.transition(Event::CalibrationDone { enabled: false }))
    }

    /// Cancel the in-flight cycle, holding the actuators
    fn abort_cycle(&mut self, now_ms: u64) {
        if self.cycle.take().is_some() {
            self.actuators.hold_all();
            self.resync_commanded();
            self.last_cycle = Some(CycleResult::Aborted);
            self.settled_at_ms = now_ms;
        }
    }

    /// Replace the commanded attitude with the one the actuators actually hold
    ///
    /// Runs whenever a cycle ends anywhere but its requested pose.
    fn resync_commanded(&mut self) {
        let lengths = self.actuators.measured_leg_lengths(&self.geometry);
        if let Ok(estimate) = kinematics::estimate_pose(&self.geometry, &lengths) {
            self.commanded = estimate.attitude();
        }
    }

    /// Latest sample if it is younger than the orientation timeout
    fn fresh_sample(&self, now_ms: u64) -> Result<Orientation, LevelError> {
        let sample = self.latest.ok_or(LevelError::StaleOrientation { age_ms: None })?;
        let age = sample.age_ms(now_ms);
        if age > self.config.orientation_timeout as u64 {
            return Err(LevelError::StaleOrientation { age_ms: Some(age) });
        }
        Ok(sample)
    }

    fn not_ready_error(&self) -> LevelError {
        if matches!(self.state, State::Uncalibrated | State::Ready { enabled: false }) && !self.is_fully_calibrated() {
            LevelError::NotCalibrated {
                imu: self.imu_calibrated,
                actuators: self.actuators_calibrated,
            }
        } else {
            LevelError::InvalidState(self.state)
        }
    }

    /// Perform state transition, keeping the transport's enable in step
    fn transition(&mut self, event: Event) -> Event {
        let was_enabled = self.state.motion_allowed();
        self.state = self.state.transition(event);
        let enabled = self.state.motion_allowed();
        if enabled != was_enabled {
            self.actuators.set_enabled(enabled);
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;
    use crate::error::{ErrorKind, FaultKind};
    use crate::traits::mock::MockTransport;

    fn controller_with(config: LevelingConfig, step: f64) -> LevelingController<MockTransport> {
        let geometry = PlatformGeometry::from_config(&PlatformConfig::default()).unwrap();
        let mock = MockTransport::new(geometry.retracted_lengths(), geometry.actuator_stroke()).with_step(step);
        LevelingController::new(geometry, config, mock).unwrap()
    }

    fn sample(roll_deg: f64, pitch_deg: f64, at_ms: u64) -> Orientation {
        Orientation::from_degrees(roll_deg, pitch_deg, 0.0, at_ms as f64 / 1000.0)
    }

    /// Calibrate both subsystems and enable at t = 0..100 ms
    fn ready(ctrl: &mut LevelingController<MockTransport>) {
        ctrl.update_orientation(sample(0.0, 0.0, 0));
        ctrl.calibrate_imu(0).unwrap();
        ctrl.calibrate_actuators(0).unwrap();
        for t in 1..=10 {
            ctrl.tick(t * 10);
        }
        assert_eq!(ctrl.state(), State::Ready { enabled: false });
        ctrl.enable().unwrap();
    }

    fn enabled_controller() -> LevelingController<MockTransport> {
        let mut ctrl = controller_with(LevelingConfig::default(), f64::INFINITY);
        ready(&mut ctrl);
        ctrl
    }

    #[test]
    fn test_enable_requires_both_calibrations() {
        let mut ctrl = controller_with(LevelingConfig::default(), f64::INFINITY);
        assert_eq!(ctrl.state(), State::Uncalibrated);
        assert_eq!(
            ctrl.enable().unwrap_err(),
            LevelError::NotCalibrated {
                imu: false,
                actuators: false
            }
        );
        assert_eq!(ctrl.state(), State::Uncalibrated);

        ctrl.update_orientation(sample(0.0, 0.0, 0));
        ctrl.calibrate_imu(0).unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: false });
        assert_eq!(
            ctrl.enable().unwrap_err(),
            LevelError::NotCalibrated {
                imu: true,
                actuators: false
            }
        );

        ctrl.calibrate_actuators(0).unwrap();
        assert_eq!(ctrl.state(), State::CalibratingActuators);
        for t in 1..=10 {
            ctrl.tick(t * 10);
        }
        assert!(ctrl.actuators().all_homed());
        ctrl.enable().unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
        assert!(ctrl.actuators().is_enabled());
    }

    #[test]
    fn test_imu_calibration_needs_fresh_sample() {
        let mut ctrl = controller_with(LevelingConfig::default(), f64::INFINITY);
        assert_eq!(
            ctrl.calibrate_imu(0).unwrap_err(),
            LevelError::StaleOrientation { age_ms: None }
        );
        assert_eq!(ctrl.state(), State::Uncalibrated);

        ctrl.update_orientation(sample(0.0, 0.0, 0));
        assert_eq!(
            ctrl.calibrate_imu(1_000).unwrap_err(),
            LevelError::StaleOrientation { age_ms: Some(1_000) }
        );
    }

    #[test]
    fn test_imu_offset_is_subtracted() {
        let mut ctrl = controller_with(LevelingConfig::default(), f64::INFINITY);
        ctrl.update_orientation(sample(1.0, -0.5, 0));
        ctrl.calibrate_imu(0).unwrap();

        ctrl.update_orientation(sample(1.5, -0.5, 100));
        let corrected = ctrl.corrected_orientation().unwrap();
        assert!((corrected.roll.to_degrees() - 0.5).abs() < 1e-9);
        assert!(corrected.pitch.abs() < 1e-12);
    }

    #[test]
    fn test_imu_recalibration_keeps_enabled() {
        let mut ctrl = enabled_controller();
        ctrl.update_orientation(sample(0.2, 0.0, 200));
        ctrl.calibrate_imu(200).unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
    }

    #[test]
    fn test_level_once_cycle() {
        let mut ctrl = enabled_controller();
        ctrl.update_orientation(sample(2.0, -1.0, 1_000));

        ctrl.level_once(1_000).unwrap();
        assert_eq!(ctrl.state(), State::ManualLevelInProgress);
        assert_eq!(ctrl.actuators().transport().sent.len(), 1);

        // A second cycle cannot start while one is in flight
        assert_eq!(
            ctrl.level_once(1_050).unwrap_err(),
            LevelError::InvalidState(State::ManualLevelInProgress)
        );

        assert_eq!(ctrl.tick(1_100), Some(Event::CycleFinished));
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
        assert_eq!(ctrl.last_cycle(), Some(CycleResult::Success));

        let commanded = ctrl.commanded();
        assert!((commanded.roll.to_degrees() + 2.0).abs() < 1e-9);
        assert!((commanded.pitch.to_degrees() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_already_level_does_not_move() {
        let mut ctrl = enabled_controller();
        ctrl.update_orientation(sample(0.05, 0.0, 1_000));

        ctrl.level_once(1_000).unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
        assert_eq!(ctrl.last_cycle(), Some(CycleResult::AlreadyLevel));
        assert!(ctrl.actuators().transport().sent.is_empty());
    }

    #[test]
    fn test_level_once_rejects_stale_orientation() {
        let mut ctrl = enabled_controller();
        let err = ctrl.level_once(5_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleOrientation);
        assert_eq!(ctrl.last_cycle(), Some(CycleResult::Rejected(err)));
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
    }

    #[test]
    fn test_level_once_requires_enabled() {
        let mut ctrl = enabled_controller();
        ctrl.disable(200).unwrap();
        ctrl.update_orientation(sample(2.0, 0.0, 300));
        assert_eq!(
            ctrl.level_once(300).unwrap_err(),
            LevelError::InvalidState(State::Ready { enabled: false })
        );
    }

    #[test]
    fn test_correction_step_is_limited() {
        let mut ctrl = enabled_controller();
        ctrl.update_orientation(sample(8.0, 0.0, 1_000));
        ctrl.level_once(1_000).unwrap();
        assert!((ctrl.commanded().roll.to_degrees() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_unreachable_pose_rejected_without_motion() {
        let config = LevelingConfig {
            leveling_height: Some(0.0),
            ..LevelingConfig::default()
        };
        let mut ctrl = controller_with(config, f64::INFINITY);
        ready(&mut ctrl);

        ctrl.update_orientation(sample(2.0, 0.0, 1_000));
        let err = ctrl.level_once(1_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnreachablePose);
        assert!(ctrl.actuators().transport().sent.is_empty());
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
    }

    #[test]
    fn test_tilt_limit_rejected() {
        let config = LevelingConfig {
            max_tilt_compensation: 3.0,
            ..LevelingConfig::default()
        };
        let mut ctrl = controller_with(config, f64::INFINITY);
        ready(&mut ctrl);

        ctrl.update_orientation(sample(4.0, 0.0, 1_000));
        let err = ctrl.level_once(1_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TiltLimitExceeded);
        assert!(ctrl.actuators().transport().sent.is_empty());
    }

    #[test]
    fn test_auto_level_deadband() {
        let mut ctrl = enabled_controller();
        assert_eq!(ctrl.toggle_auto_level(500), Ok(true));
        assert_eq!(ctrl.state(), State::AutoLeveling);

        ctrl.update_orientation(sample(0.3, 0.0, 1_000));
        ctrl.tick(1_000);
        assert!(ctrl.actuators().transport().sent.is_empty());

        ctrl.update_orientation(sample(0.8, 0.0, 1_100));
        ctrl.tick(1_100);
        assert_eq!(ctrl.actuators().transport().sent.len(), 1);
        assert_eq!(ctrl.state(), State::AutoLeveling);

        // Cycle completes on the next tick; the stale 0.8° sample is ignored
        ctrl.tick(1_200);
        assert_eq!(ctrl.last_cycle(), Some(CycleResult::Success));
        ctrl.tick(1_300);
        assert_eq!(ctrl.actuators().transport().sent.len(), 1);
    }

    #[test]
    fn test_auto_level_skips_stale_orientation() {
        let mut ctrl = enabled_controller();
        ctrl.toggle_auto_level(500).unwrap();
        ctrl.update_orientation(sample(3.0, 0.0, 500));

        ctrl.tick(2_000);
        assert!(ctrl.status().orientation_stale);
        assert!(ctrl.actuators().transport().sent.is_empty());
        assert_eq!(ctrl.state(), State::AutoLeveling);
    }

    #[test]
    fn test_toggle_auto_level_off() {
        let mut ctrl = enabled_controller();
        ctrl.toggle_auto_level(500).unwrap();
        assert_eq!(ctrl.toggle_auto_level(600), Ok(false));
        assert_eq!(ctrl.state(), State::Ready { enabled: true });
        assert!(!ctrl.is_auto_level_enabled());

        ctrl.disable(700).unwrap();
        assert_eq!(
            ctrl.toggle_auto_level(800).unwrap_err(),
            LevelError::InvalidState(State::Ready { enabled: false })
        );
    }

    #[test]
    fn test_disable_during_auto_level() {
        let mut ctrl = enabled_controller();
        ctrl.toggle_auto_level(500).unwrap();
        ctrl.disable(600).unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: false });
        assert!(!ctrl.is_auto_level_enabled());
        assert!(!ctrl.actuators().is_enabled());
    }

    #[test]
    fn test_emergency_stop_mid_cycle() {
        let mut ctrl = controller_with(LevelingConfig::default(), 0.01);
        ready(&mut ctrl);
        ctrl.update_orientation(sample(3.0, 0.0, 1_000));
        ctrl.level_once(1_000).unwrap();
        ctrl.tick(1_100);
        ctrl.tick(1_200);

        assert_eq!(ctrl.emergency_stop(1_250), Event::EmergencyStop);

        let status = ctrl.status();
        assert_eq!(status.state, State::EmergencyStopped);
        assert_eq!(status.last_cycle, Some(CycleResult::Aborted));
        assert!(!status.auto_level_enabled);
        for actuator in status.actuators.iter() {
            assert_eq!(actuator.target_length, actuator.current_length);
        }
        // Legs moved in step, so the held attitude is still level
        assert!(status.commanded.tilt().to_degrees() < 0.5);

        // Nothing but reset is accepted
        assert_eq!(
            ctrl.level_once(1_300).unwrap_err(),
            LevelError::InvalidState(State::EmergencyStopped)
        );
        ctrl.reset().unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: false });
        ctrl.enable().unwrap();
    }

    #[test]
    fn test_reset_only_from_emergency_stop() {
        let mut ctrl = enabled_controller();
        assert_eq!(
            ctrl.reset().unwrap_err(),
            LevelError::InvalidState(State::Ready { enabled: true })
        );
    }

    #[test]
    fn test_reset_after_fault_requires_recalibration() {
        let mut ctrl = enabled_controller();
        ctrl.transport_mut().silent[0] = true;
        ctrl.tick(1_500);
        assert!(ctrl.status().any_fault());

        ctrl.emergency_stop(1_600);
        ctrl.reset().unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: false });
        assert!(!ctrl.status().actuators_calibrated);
        assert_eq!(
            ctrl.enable().unwrap_err(),
            LevelError::NotCalibrated {
                imu: true,
                actuators: false
            }
        );
    }

    #[test]
    fn test_actuator_fault_fails_cycle() {
        let mut ctrl = controller_with(LevelingConfig::default(), 0.01);
        ready(&mut ctrl);
        ctrl.transport_mut().frozen[1] = true;
        ctrl.update_orientation(sample(3.0, 0.0, 1_000));
        ctrl.level_once(1_000).unwrap();

        let mut t = 1_000;
        while ctrl.state() == State::ManualLevelInProgress && t < 10_000 {
            t += 100;
            ctrl.tick(t);
        }

        assert_eq!(ctrl.state(), State::Ready { enabled: true });
        assert_eq!(
            ctrl.last_cycle(),
            Some(CycleResult::Failed(LevelError::ActuatorFault {
                actuator: 1,
                kind: FaultKind::Stall
            }))
        );
        for actuator in ctrl.status().actuators.iter() {
            assert_eq!(actuator.target_length, actuator.current_length);
        }

        // Platform is held until recalibration
        ctrl.update_orientation(sample(3.0, 0.0, t));
        let err = ctrl.level_once(t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ActuatorFault);
    }

    #[test]
    fn test_cycle_timeout() {
        let config = LevelingConfig {
            actuator_timeout: 1_000,
            ..LevelingConfig::default()
        };
        let mut ctrl = controller_with(config, 0.005);
        ready(&mut ctrl);
        ctrl.update_orientation(sample(2.0, 0.0, 1_000));
        ctrl.level_once(1_000).unwrap();

        let mut t = 1_000;
        while ctrl.state() == State::ManualLevelInProgress && t < 5_000 {
            t += 100;
            ctrl.tick(t);
        }
        assert_eq!(ctrl.last_cycle(), Some(CycleResult::TimedOut));
        assert!(t > 2_000);
        assert!(!ctrl.status().any_fault());
    }

    #[test]
    fn test_calibration_not_allowed_mid_cycle() {
        let mut ctrl = controller_with(LevelingConfig::default(), 0.01);
        ready(&mut ctrl);
        ctrl.update_orientation(sample(2.0, 0.0, 1_000));
        ctrl.level_once(1_000).unwrap();
        assert_eq!(
            ctrl.calibrate_actuators(1_050).unwrap_err(),
            LevelError::InvalidState(State::ManualLevelInProgress)
        );
    }

    #[test]
    fn test_homing_failure_leaves_actuators_uncalibrated() {
        let mut ctrl = controller_with(LevelingConfig::default(), f64::INFINITY);
        {
            let mock = ctrl.transport_mut();
            mock.positions[2] = 0.5;
            mock.frozen[2] = true;
        }
        ctrl.calibrate_actuators(0).unwrap();

        let mut t = 0;
        while ctrl.state() == State::CalibratingActuators && t < 40_000 {
            t += 100;
            ctrl.tick(t);
        }
        assert_eq!(ctrl.state(), State::Uncalibrated);
        assert!(!ctrl.status().actuators_calibrated);
        assert_eq!(
            ctrl.actuators().first_fault(),
            Some((2, FaultKind::HomingTimeout))
        );
    }

    #[test]
    fn test_new_rejects_mismatched_transport() {
        let geometry = PlatformGeometry::from_config(&PlatformConfig::default()).unwrap();
        let mock = MockTransport::new(&[0.3; 6], 0.4);
        let err = LevelingController::new(geometry, LevelingConfig::default(), mock).err();
        assert_eq!(err, Some(LevelError::LengthCount { expected: 3, actual: 6 }));
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        for step in [-1.0, f64::NAN] {
            let geometry = PlatformGeometry::from_config(&PlatformConfig::default()).unwrap();
            let mock = MockTransport::new(geometry.retracted_lengths(), geometry.actuator_stroke());
            let config = LevelingConfig {
                max_correction_step: step,
                ..LevelingConfig::default()
            };
            let err = LevelingController::new(geometry, config, mock).err();
            assert_eq!(
                err,
                Some(LevelError::InvalidConfig {
                    field: "max_correction_step"
                })
            );
        }
    }

    #[test]
    fn test_limit_switch_stop_resyncs_commanded() {
        let geometry = PlatformGeometry::from_config(&PlatformConfig::default()).unwrap();
        // Legs run out of travel 10 mm above the leveling height
        let mock = MockTransport::new(geometry.retracted_lengths(), 0.21);
        let mut ctrl = LevelingController::new(geometry, LevelingConfig::default(), mock).unwrap();
        ready(&mut ctrl);

        ctrl.update_orientation(sample(4.0, 0.0, 1_000));
        ctrl.level_once(1_000).unwrap();
        assert_eq!(ctrl.tick(1_100), Some(Event::CycleFinished));
        assert_eq!(ctrl.state(), State::Ready { enabled: true });

        let result = ctrl.last_cycle();
        assert!(matches!(result, Some(CycleResult::LimitReached { .. })), "{result:?}");
        let limited: std::vec::Vec<bool> = ctrl.status().actuators.iter().map(|a| a.at_max_limit).collect();
        assert_eq!(limited.iter().filter(|&&l| l).count(), 1);

        // Commanded attitude is what the legs reached, not the 4° requested
        let roll = ctrl.commanded().roll.to_degrees().abs();
        assert!(roll > 1.5 && roll < 3.5, "commanded roll {roll}");
        assert_eq!(ctrl.status().commanded, ctrl.commanded());
    }

    #[test]
    fn test_execute_dispatch() {
        let mut ctrl = enabled_controller();
        ctrl.execute(Command::ToggleAutoLevel, 500).unwrap();
        assert_eq!(ctrl.state(), State::AutoLeveling);
        ctrl.execute(Command::EmergencyStop, 600).unwrap();
        assert_eq!(ctrl.state(), State::EmergencyStopped);
        ctrl.execute(Command::Reset, 700).unwrap();
        assert_eq!(ctrl.state(), State::Ready { enabled: false });
    }
}
