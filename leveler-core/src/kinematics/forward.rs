//! Forward kinematics
//!
//! Recovers the roll, pitch and heave that best explain a set of actuator
//! lengths. Used to check the tilt a candidate command would produce and by
//! simulated sensors to derive platform attitude from actuator positions.

use super::solver::pose_lengths;
use crate::config::PlatformGeometry;
use crate::error::LevelError;
use crate::math::{Mat3, Vec3};
use crate::traits::Orientation;

const MAX_ITERATIONS: u8 = 25;
const STEP_TOLERANCE: f64 = 1e-10;
/// Central-difference step for the numeric Jacobian
const DIFF_STEP: f64 = 1e-7;

/// Result of a forward kinematics solve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PoseEstimate {
    pub roll: f64,
    pub pitch: f64,
    /// Height above the neutral pose (m)
    pub heave: f64,
    /// Root-mean-square length error of the fit (m)
    pub rms_error: f64,
    pub iterations: u8,
}

impl PoseEstimate {
    pub fn tilt(&self) -> f64 {
        crate::math::tilt_magnitude(self.roll, self.pitch)
    }

    /// Roll and pitch as an untimed attitude
    pub fn attitude(&self) -> Orientation {
        Orientation::attitude(self.roll, self.pitch)
    }
}

/// Fit roll, pitch and heave to a set of leg lengths
///
/// Gauss-Newton over the three restricted degrees of freedom, starting from
/// a level platform at the mean extension.
pub fn estimate_pose(geometry: &PlatformGeometry, lengths: &[f64]) -> Result<PoseEstimate, LevelError> {
    let n = geometry.actuator_count();
    if lengths.len() != n {
        return Err(LevelError::LengthCount {
            expected: n as u8,
            actual: lengths.len().min(u8::MAX as usize) as u8,
        });
    }

    let mean_extension = lengths
        .iter()
        .zip(geometry.retracted_lengths())
        .map(|(l, r)| l - r)
        .sum::<f64>()
        / n as f64;

    let mut x = [0.0, 0.0, mean_extension];
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let residual = residuals(geometry, lengths, x);
        let mut jacobian = [[0.0; 3]; 6];
        for col in 0..3 {
            let mut forward = x;
            let mut backward = x;
            forward[col] += DIFF_STEP;
            backward[col] -= DIFF_STEP;
            let rf = residuals(geometry, lengths, forward);
            let rb = residuals(geometry, lengths, backward);
            for row in 0..n {
                jacobian[row][col] = (rf[row] - rb[row]) / (2.0 * DIFF_STEP);
            }
        }

        // Normal equations: (JᵀJ) Δ = −Jᵀr
        let mut jtj = [[0.0; 3]; 3];
        let mut jtr = [0.0; 3];
        for row in 0..n {
            for i in 0..3 {
                jtr[i] += jacobian[row][i] * residual[row];
                for j in 0..3 {
                    jtj[i][j] += jacobian[row][i] * jacobian[row][j];
                }
            }
        }

        let Some(delta) = Mat3::from_rows(jtj).solve(Vec3::new(-jtr[0], -jtr[1], -jtr[2])) else {
            break;
        };
        x[0] += delta.x;
        x[1] += delta.y;
        x[2] += delta.z;

        if delta.norm() < STEP_TOLERANCE {
            break;
        }
    }

    let residual = residuals(geometry, lengths, x);
    let sum_sq: f64 = residual[..n].iter().map(|r| r * r).sum();

    Ok(PoseEstimate {
        roll: x[0],
        pitch: x[1],
        heave: x[2],
        rms_error: libm::sqrt(sum_sq / n as f64),
        iterations,
    })
}

fn residuals(geometry: &PlatformGeometry, lengths: &[f64], x: [f64; 3]) -> [f64; 6] {
    let modelled = pose_lengths(geometry, &Orientation::attitude(x[0], x[1]), Vec3::new(0.0, 0.0, x[2]));
    let mut out = [0.0; 6];
    for (slot, (m, l)) in out.iter_mut().zip(modelled.iter().zip(lengths)) {
        *slot = m - l;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlatformConfig, PlatformVariant};
    use crate::kinematics::solve;

    #[test]
    fn test_recovers_solved_pose() {
        for variant in PlatformVariant::ALL {
            let g = PlatformGeometry::from_config(&PlatformConfig::for_variant(variant)).unwrap();
            let pose = Orientation::from_degrees(3.0, -4.5, 0.0, 0.0);
            let lengths = solve(&g, &pose, Vec3::new(0.0, 0.0, 0.2)).unwrap();

            let estimate = estimate_pose(&g, &lengths).unwrap();
            assert!((estimate.roll - pose.roll).abs() < 1e-8, "{:?}", variant);
            assert!((estimate.pitch - pose.pitch).abs() < 1e-8, "{:?}", variant);
            assert!((estimate.heave - 0.2).abs() < 1e-8, "{:?}", variant);
            assert!(estimate.rms_error < 1e-9);
        }
    }

    #[test]
    fn test_level_platform() {
        let g = PlatformGeometry::from_config(&PlatformConfig::default()).unwrap();
        let lengths = [0.45, 0.45, 0.45];
        let estimate = estimate_pose(&g, &lengths).unwrap();
        assert!(estimate.tilt() < 1e-12);
        assert!((estimate.heave - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_length_count() {
        let g = PlatformGeometry::from_config(&PlatformConfig::default()).unwrap();
        assert_eq!(
            estimate_pose(&g, &[0.3; 6]).unwrap_err(),
            LevelError::LengthCount { expected: 3, actual: 6 }
        );
    }
}
