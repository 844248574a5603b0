//! Hardware abstraction traits
//!
//! These traits define the interface between the leveling logic and the
//! orientation and actuator collaborators.

pub mod actuator;
pub mod orientation;

#[cfg(test)]
pub(crate) mod mock;

pub use actuator::{ActuatorFeedback, ActuatorTransport, TransportError};
pub use orientation::{Orientation, OrientationSource};
