//! Platform kinematics
//!
//! Inverse kinematics turns a desired orientation and translation into
//! actuator lengths; forward kinematics estimates the attitude a set of
//! lengths produces.

pub mod forward;
pub mod solver;

pub use forward::{estimate_pose, PoseEstimate};
pub use solver::{effective_pose, extensions, platform_points, pose_lengths, solve, ActuatorLengths};

pub use crate::math::tilt_magnitude;
