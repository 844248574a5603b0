//! Actuator drivers

pub mod sim;

pub use sim::{SimActuator, SimActuatorConfig, SimulatedActuatorBank};
