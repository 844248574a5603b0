//! Actuator transport trait
//!
//! The transport moves lengths in and feedback out. Lengths are raw
//! transport-frame values in metres; the zero offset recorded at homing maps
//! them onto stroke travel. Implementations must never block: commands are
//! queued and feedback is whatever has arrived since the last call.

use core::fmt;

/// Errors reported by an actuator transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Link to the actuator controller is down
    Disconnected,
    /// Actuator index does not exist
    InvalidIndex,
    /// Controller refused the request
    Rejected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransportError::Disconnected => "link disconnected",
            TransportError::InvalidIndex => "invalid actuator index",
            TransportError::Rejected => "request rejected",
        };
        f.write_str(text)
    }
}

/// One feedback report for one actuator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorFeedback {
    /// Measured length in the transport frame (m)
    pub current_length: f64,
    /// Minimum (retracted) limit switch closed
    pub at_min_limit: bool,
    /// Maximum (extended) limit switch closed
    pub at_max_limit: bool,
}

/// Link to a set of linear actuators
pub trait ActuatorTransport {
    /// Number of actuators behind this link
    fn actuator_count(&self) -> usize;

    /// Queue a complete target vector, one length per actuator
    fn send_targets(&mut self, targets: &[f64]) -> Result<(), TransportError>;

    /// Start driving one actuator toward its minimum limit switch
    fn home(&mut self, index: usize) -> Result<(), TransportError>;

    /// Stop one actuator where it is
    fn halt(&mut self, index: usize);

    /// Stop every actuator where it is
    fn halt_all(&mut self) {
        for index in 0..self.actuator_count() {
            self.halt(index);
        }
    }

    /// Enable or disable the actuator drivers
    ///
    /// Disabled actuators hold position and ignore targets.
    fn set_enabled(&mut self, enabled: bool);

    /// Newest feedback for one actuator since the previous call
    ///
    /// Returns `None` when nothing new has arrived.
    fn feedback(&mut self, index: usize) -> Option<ActuatorFeedback>;
}
