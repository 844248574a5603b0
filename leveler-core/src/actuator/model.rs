//! Actuator bank
//!
//! Owns the actuator transport and the per-actuator state. All mutation
//! happens through [`ActuatorBank::set_targets`], [`ActuatorBank::home`] and
//! [`ActuatorBank::poll_feedback`]; readers get copies via
//! [`ActuatorBank::snapshot`].

use heapless::Vec;

use crate::config::{LevelingConfig, PlatformGeometry, MAX_ACTUATORS};
use crate::error::{FaultKind, LevelError};
use crate::kinematics::solver::{ActuatorLengths, RANGE_EPSILON};
use crate::traits::{ActuatorFeedback, ActuatorTransport};

/// Known state of one actuator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorState {
    pub index: u8,
    /// Last reported length, transport frame (m)
    pub current_length: f64,
    /// Commanded length, transport frame (m)
    pub target_length: f64,
    /// Length reported at the minimum limit during homing
    pub zero_offset: f64,
    pub at_min_limit: bool,
    pub at_max_limit: bool,
    pub fault: bool,
    pub fault_kind: Option<FaultKind>,
    /// Zero offset recorded since the last calibration
    pub homed: bool,
    /// Time of the last feedback report
    pub last_update_ms: Option<u64>,
}

impl ActuatorState {
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            current_length: 0.0,
            target_length: 0.0,
            zero_offset: 0.0,
            at_min_limit: false,
            at_max_limit: false,
            fault: false,
            fault_kind: None,
            homed: false,
            last_update_ms: None,
        }
    }

    /// Current stroke travel from the homed position (m)
    pub fn travel(&self) -> f64 {
        self.current_length - self.zero_offset
    }

    /// Distance still to go (m)
    pub fn remaining(&self) -> f64 {
        libm::fabs(self.target_length - self.current_length)
    }
}

/// Bounds and timeouts applied by the bank
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorLimits {
    /// Usable travel (m)
    pub stroke: f64,
    /// Position tolerance (m)
    pub tolerance: f64,
    pub feedback_timeout_ms: u64,
    pub stall_timeout_ms: u64,
    pub homing_timeout_ms: u64,
}

impl ActuatorLimits {
    pub fn new(geometry: &PlatformGeometry, config: &LevelingConfig) -> Self {
        Self {
            stroke: geometry.actuator_stroke(),
            tolerance: config.feedback_tolerance,
            feedback_timeout_ms: config.feedback_timeout as u64,
            stall_timeout_ms: config.stall_timeout as u64,
            homing_timeout_ms: config.homing_timeout as u64,
        }
    }
}

/// Progress tracking for stall detection
#[derive(Debug, Clone, Copy, Default)]
struct Motion {
    moving: bool,
    best_error: f64,
    progress_ms: u64,
    /// Stopped by a limit switch short of the last target
    limited: bool,
}

#[derive(Debug, Clone, Copy)]
struct HomingRun {
    index: usize,
    started_ms: u64,
}

/// Actuator bank: transport plus per-actuator state
pub struct ActuatorBank<T: ActuatorTransport> {
    transport: T,
    states: Vec<ActuatorState, MAX_ACTUATORS>,
    motion: Vec<Motion, MAX_ACTUATORS>,
    limits: ActuatorLimits,
    homing: Option<HomingRun>,
    /// First poll time; silence is measured from here until a report arrives
    epoch_ms: Option<u64>,
    enabled: bool,
}

impl<T: ActuatorTransport> ActuatorBank<T> {
    pub fn new(transport: T, limits: ActuatorLimits) -> Self {
        let count = transport.actuator_count().min(MAX_ACTUATORS);
        let mut states = Vec::new();
        let mut motion = Vec::new();
        for index in 0..count {
            let _ = states.push(ActuatorState::new(index as u8));
            let _ = motion.push(Motion::default());
        }

        Self {
            transport,
            states,
            motion,
            limits,
            homing: None,
            epoch_ms: None,
            enabled: false,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn limits(&self) -> &ActuatorLimits {
        &self.limits
    }

    pub fn states(&self) -> &[ActuatorState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&ActuatorState> {
        self.states.get(index)
    }

    /// Owned copy of every actuator state
    pub fn snapshot(&self) -> Vec<ActuatorState, MAX_ACTUATORS> {
        self.states.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the actuator drivers
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.transport.set_enabled(enabled);
        if !enabled {
            for motion in self.motion.iter_mut() {
                motion.moving = false;
            }
        }
    }

    /// Issue a new target vector in the transport frame
    ///
    /// Every target must keep its actuator within `[0, stroke]` of its zero
    /// offset. Nothing is sent unless the whole vector is valid.
    pub fn set_targets(&mut self, targets: &[f64], now_ms: u64) -> Result<(), LevelError> {
        if targets.len() != self.states.len() {
            return Err(LevelError::LengthCount {
                expected: self.states.len() as u8,
                actual: targets.len().min(u8::MAX as usize) as u8,
            });
        }
        if let Some((actuator, kind)) = self.first_fault() {
            return Err(LevelError::ActuatorFault { actuator, kind });
        }
        if !self.all_homed() {
            return Err(LevelError::NotCalibrated {
                imu: true,
                actuators: false,
            });
        }

        for (state, &target) in self.states.iter().zip(targets) {
            let travel = target - state.zero_offset;
            if !travel.is_finite() || travel < -RANGE_EPSILON || travel > self.limits.stroke + RANGE_EPSILON {
                return Err(LevelError::OutOfRange {
                    actuator: state.index,
                    travel,
                });
            }
        }

        self.transport.send_targets(targets)?;

        for ((state, motion), &target) in self.states.iter_mut().zip(self.motion.iter_mut()).zip(targets) {
            state.target_length = target;
            *motion = Motion {
                moving: true,
                best_error: state.remaining(),
                progress_ms: now_ms,
                limited: false,
            };
        }
        Ok(())
    }

    /// Drain feedback from the transport and update fault detection
    ///
    /// Never blocks. Returns the latest known state of every actuator.
    pub fn poll_feedback(&mut self, now_ms: u64) -> &[ActuatorState] {
        let epoch = *self.epoch_ms.get_or_insert(now_ms);

        for index in 0..self.states.len() {
            match self.transport.feedback(index) {
                Some(report) => self.apply_feedback(index, report, now_ms),
                None => {
                    let last = self.states[index].last_update_ms.unwrap_or(epoch);
                    if now_ms.saturating_sub(last) > self.limits.feedback_timeout_ms {
                        self.fault(index, FaultKind::Timeout);
                    }
                }
            }
        }

        self.check_homing(now_ms);
        self.check_stalls(now_ms);
        &self.states
    }

    /// Every actuator within `tolerance` of its target
    pub fn is_at_target(&self, tolerance: f64) -> bool {
        self.states.iter().all(|s| !s.fault && s.remaining() <= tolerance)
    }

    /// Lowest-indexed actuator a limit switch stopped since the last targets
    pub fn limit_stop(&self) -> Option<u8> {
        self.states
            .iter()
            .zip(self.motion.iter())
            .find(|(_, m)| m.limited)
            .map(|(s, _)| s.index)
    }

    /// Start homing one actuator
    ///
    /// The zero offset is recorded when a later poll reports the minimum
    /// limit switch closed. Starting a new run cancels any run in progress.
    pub fn home(&mut self, index: usize, now_ms: u64) -> Result<(), LevelError> {
        if index >= self.states.len() {
            return Err(crate::traits::TransportError::InvalidIndex.into());
        }
        if let Some(run) = self.homing.take() {
            self.transport.halt(run.index);
        }

        self.transport.home(index)?;
        let state = &mut self.states[index];
        state.homed = false;
        state.fault = false;
        state.fault_kind = None;
        self.motion[index].moving = false;
        self.homing = Some(HomingRun {
            index,
            started_ms: now_ms,
        });
        Ok(())
    }

    /// Index of the actuator currently homing
    pub fn homing_in_progress(&self) -> Option<u8> {
        self.homing.map(|run| run.index as u8)
    }

    /// Whether `index` has a zero offset from a finished homing run
    pub fn homing_complete(&self, index: usize) -> bool {
        self.states.get(index).is_some_and(|s| s.homed)
    }

    pub fn all_homed(&self) -> bool {
        self.states.iter().all(|s| s.homed)
    }

    /// Forget every zero offset; actuators must be homed again
    pub fn invalidate_calibration(&mut self) {
        for state in self.states.iter_mut() {
            state.homed = false;
        }
    }

    /// Hold every actuator at its current length
    pub fn hold_all(&mut self) {
        for (state, motion) in self.states.iter_mut().zip(self.motion.iter_mut()) {
            state.target_length = state.current_length;
            motion.moving = false;
        }
        self.homing = None;
        self.transport.halt_all();
    }

    /// Clear fault flags ahead of recalibration
    pub fn clear_faults(&mut self) {
        for state in self.states.iter_mut() {
            state.fault = false;
            state.fault_kind = None;
        }
    }

    pub fn any_fault(&self) -> bool {
        self.states.iter().any(|s| s.fault)
    }

    /// Lowest-indexed faulted actuator
    pub fn first_fault(&self) -> Option<(u8, FaultKind)> {
        self.states
            .iter()
            .find(|s| s.fault)
            .map(|s| (s.index, s.fault_kind.unwrap_or(FaultKind::Timeout)))
    }

    /// Convert solver leg lengths into transport-frame targets
    ///
    /// Each target is the actuator's zero offset plus the leg's extension
    /// beyond its retracted length.
    pub fn leg_lengths_to_targets(&self, geometry: &PlatformGeometry, lengths: &[f64]) -> ActuatorLengths {
        let mut targets = Vec::new();
        for ((state, &length), &retracted) in self
            .states
            .iter()
            .zip(lengths)
            .zip(geometry.retracted_lengths())
        {
            let _ = targets.push(state.zero_offset + (length - retracted));
        }
        targets
    }

    /// Leg lengths implied by the latest feedback
    pub fn measured_leg_lengths(&self, geometry: &PlatformGeometry) -> ActuatorLengths {
        self.states
            .iter()
            .zip(geometry.retracted_lengths())
            .map(|(state, &retracted)| retracted + state.travel())
            .collect()
    }

    fn apply_feedback(&mut self, index: usize, report: ActuatorFeedback, now_ms: u64) {
        let tolerance = self.limits.tolerance;
        let homing_this = self.homing.is_some_and(|run| run.index == index);

        let state = &mut self.states[index];
        state.current_length = report.current_length;
        state.at_min_limit = report.at_min_limit;
        state.at_max_limit = report.at_max_limit;
        state.last_update_ms = Some(now_ms);

        if homing_this {
            if report.at_min_limit {
                state.zero_offset = report.current_length;
                state.target_length = report.current_length;
                state.homed = true;
                self.homing = None;
            }
            return;
        }
        if !state.homed {
            return;
        }

        let travel = state.travel();
        if travel < -tolerance || travel > self.limits.stroke + tolerance {
            self.fault(index, FaultKind::OutOfBounds);
            return;
        }

        // Limit switch reached in the direction of travel: stop here
        let heading_down = state.target_length < state.current_length - tolerance;
        let heading_up = state.target_length > state.current_length + tolerance;
        if (report.at_min_limit && heading_down) || (report.at_max_limit && heading_up) {
            state.target_length = state.current_length;
            self.motion[index].moving = false;
            self.motion[index].limited = true;
            self.transport.halt(index);
        }
    }

    fn check_homing(&mut self, now_ms: u64) {
        if let Some(run) = self.homing {
            if now_ms.saturating_sub(run.started_ms) > self.limits.homing_timeout_ms {
                self.homing = None;
                self.fault(run.index, FaultKind::HomingTimeout);
            }
        }
    }

    fn check_stalls(&mut self, now_ms: u64) {
        if !self.enabled {
            return;
        }
        let tolerance = self.limits.tolerance;

        for index in 0..self.states.len() {
            let state = self.states[index];
            let motion = &mut self.motion[index];
            if !motion.moving || state.fault {
                continue;
            }

            let error = state.remaining();
            if error <= tolerance {
                motion.moving = false;
            } else if error < motion.best_error - tolerance {
                motion.best_error = error;
                motion.progress_ms = now_ms;
            } else if now_ms.saturating_sub(motion.progress_ms) > self.limits.stall_timeout_ms {
                self.fault(index, FaultKind::Stall);
            }
        }
    }

    /// Latch a fault and stop the actuator where it is
    fn fault(&mut self, index: usize, kind: FaultKind) {
        let state = &mut self.states[index];
        if !state.fault {
            state.fault = true;
            state.fault_kind = Some(kind);
        }
        state.target_length = state.current_length;
        self.motion[index].moving = false;
        if self.homing.is_some_and(|run| run.index == index) {
            self.homing = None;
        }
        self.transport.halt(index);
    }
}
