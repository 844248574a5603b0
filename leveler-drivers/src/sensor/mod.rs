//! Orientation sensor drivers

pub mod tilt;

pub use tilt::SimulatedTiltSensor;
