//! Inverse kinematics
//!
//! Every variant shares the closing formula
//!
//! ```text
//! P_i = R · (P_i0 − centroid) + centroid + t
//! L_i = |P_i − B_i|
//! ```
//!
//! and differs only in which degrees of freedom of the requested pose reach
//! `R` and `t`.

use heapless::Vec;

use crate::config::{PlatformGeometry, PlatformVariant, MAX_ACTUATORS};
use crate::error::LevelError;
use crate::math::{Mat3, Vec3};
use crate::traits::Orientation;

/// One length per actuator (m)
pub type ActuatorLengths = Vec<f64, MAX_ACTUATORS>;

/// Extensions this close to a stroke bound are snapped onto it (m)
pub const RANGE_EPSILON: f64 = 1e-9;

/// Rotation and translation actually applied for a variant
///
/// Tripod and 3-DOF Stewart platforms honour roll, pitch and heave only.
pub fn effective_pose(variant: PlatformVariant, orientation: &Orientation, translation: Vec3) -> (Mat3, Vec3) {
    if variant.full_dof() {
        (
            Mat3::rot_z(orientation.yaw) * Mat3::rot_y(orientation.pitch) * Mat3::rot_x(orientation.roll),
            translation,
        )
    } else {
        (
            Mat3::rot_x(orientation.roll) * Mat3::rot_y(orientation.pitch),
            Vec3::new(0.0, 0.0, translation.z),
        )
    }
}

/// Platform attachment points for a pose
pub fn platform_points(
    geometry: &PlatformGeometry,
    orientation: &Orientation,
    translation: Vec3,
) -> Vec<Vec3, MAX_ACTUATORS> {
    let (rotation, t) = effective_pose(geometry.variant(), orientation, translation);
    let centroid = geometry.centroid();

    let mut points = Vec::new();
    for &p0 in geometry.platform_points() {
        let _ = points.push(rotation * (p0 - centroid) + centroid + t);
    }
    points
}

/// Leg lengths for a pose, without range checks
pub fn pose_lengths(geometry: &PlatformGeometry, orientation: &Orientation, translation: Vec3) -> ActuatorLengths {
    let mut lengths = Vec::new();
    for (p, &b) in platform_points(geometry, orientation, translation)
        .iter()
        .zip(geometry.base_points())
    {
        let _ = lengths.push((*p - b).norm());
    }
    lengths
}

/// Solve for the actuator lengths that realise a pose
///
/// `translation` is measured from the neutral pose (platform at
/// `min_height`). Fails with `UnreachablePose` when any actuator would need
/// an extension outside `[0, stroke]`; lengths are never silently clamped.
pub fn solve(
    geometry: &PlatformGeometry,
    orientation: &Orientation,
    translation: Vec3,
) -> Result<ActuatorLengths, LevelError> {
    geometry.check_point_counts()?;

    let stroke = geometry.actuator_stroke();
    let raw = pose_lengths(geometry, orientation, translation);

    let mut lengths = Vec::new();
    for (index, (&length, &retracted)) in raw.iter().zip(geometry.retracted_lengths()).enumerate() {
        let extension = length - retracted;
        if !extension.is_finite() || extension < -RANGE_EPSILON || extension > stroke + RANGE_EPSILON {
            return Err(LevelError::UnreachablePose {
                actuator: index as u8,
                extension,
            });
        }
        let _ = lengths.push(retracted + extension.clamp(0.0, stroke));
    }
    Ok(lengths)
}

/// Stroke-relative extension of each length
pub fn extensions(geometry: &PlatformGeometry, lengths: &[f64]) -> ActuatorLengths {
    let mut out = Vec::new();
    for (&length, &retracted) in lengths.iter().zip(geometry.retracted_lengths()) {
        let _ = out.push(length - retracted);
    }
    out
}
