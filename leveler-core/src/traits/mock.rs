//! In-memory actuator transport for unit tests

use super::actuator::{ActuatorFeedback, ActuatorTransport, TransportError};

/// Actuators that move `step` metres toward their target per feedback read
pub struct MockTransport {
    pub positions: Vec<f64>,
    pub targets: Vec<f64>,
    pub min: Vec<f64>,
    pub stroke: f64,
    pub step: f64,
    pub enabled: bool,
    pub homing: Vec<bool>,
    /// Actuators that ignore commands
    pub frozen: Vec<bool>,
    /// Actuators that never report
    pub silent: Vec<bool>,
    pub sent: Vec<Vec<f64>>,
    pub halts: usize,
    pub disconnected: bool,
}

impl MockTransport {
    /// Actuators resting at `min`, moving instantly
    pub fn new(min: &[f64], stroke: f64) -> Self {
        let n = min.len();
        Self {
            positions: min.to_vec(),
            targets: min.to_vec(),
            min: min.to_vec(),
            stroke,
            step: f64::INFINITY,
            enabled: false,
            homing: vec![false; n],
            frozen: vec![false; n],
            silent: vec![false; n],
            sent: Vec::new(),
            halts: 0,
            disconnected: false,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    fn advance(&mut self, index: usize) {
        if self.frozen[index] {
            return;
        }
        let goal = if self.homing[index] {
            self.min[index]
        } else if self.enabled {
            self.targets[index]
        } else {
            return;
        };

        let pos = self.positions[index];
        let delta = (goal - pos).clamp(-self.step, self.step);
        let lo = self.min[index];
        self.positions[index] = (pos + delta).clamp(lo, lo + self.stroke);

        if self.homing[index] && self.positions[index] <= lo {
            self.homing[index] = false;
            self.targets[index] = lo;
        }
    }
}

impl ActuatorTransport for MockTransport {
    fn actuator_count(&self) -> usize {
        self.positions.len()
    }

    fn send_targets(&mut self, targets: &[f64]) -> Result<(), TransportError> {
        if self.disconnected {
            return Err(TransportError::Disconnected);
        }
        self.targets = targets.to_vec();
        self.sent.push(targets.to_vec());
        Ok(())
    }

    fn home(&mut self, index: usize) -> Result<(), TransportError> {
        if index >= self.positions.len() {
            return Err(TransportError::InvalidIndex);
        }
        self.homing[index] = true;
        Ok(())
    }

    fn halt(&mut self, index: usize) {
        if let Some(pos) = self.positions.get(index) {
            self.targets[index] = *pos;
            self.homing[index] = false;
            self.halts += 1;
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn feedback(&mut self, index: usize) -> Option<ActuatorFeedback> {
        if self.disconnected || self.silent[index] {
            return None;
        }
        self.advance(index);
        let pos = self.positions[index];
        let lo = self.min[index];
        Some(ActuatorFeedback {
            current_length: pos,
            at_min_limit: pos <= lo + 1e-9,
            at_max_limit: pos >= lo + self.stroke - 1e-9,
        })
    }
}
