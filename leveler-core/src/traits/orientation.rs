//! Orientation source trait
//!
//! The controller only ever needs the most recent sample and its age. How
//! samples are produced (network IMU, on-board sensor fusion, simulation)
//! is outside the core.

use crate::math::tilt_magnitude;

/// Platform attitude sample
///
/// Angles in radians, `timestamp` in seconds on the same clock the control
/// loop uses. Yaw is ignored by the tripod and 3-DOF Stewart variants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub timestamp: f64,
}

impl Orientation {
    pub const fn new(roll: f64, pitch: f64, yaw: f64, timestamp: f64) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            timestamp,
        }
    }

    /// Untimed roll/pitch attitude, used for commanded poses
    pub const fn attitude(roll: f64, pitch: f64) -> Self {
        Self::new(roll, pitch, 0.0, 0.0)
    }

    /// Build a sample from angles in degrees
    pub fn from_degrees(roll: f64, pitch: f64, yaw: f64, timestamp: f64) -> Self {
        Self::new(roll.to_radians(), pitch.to_radians(), yaw.to_radians(), timestamp)
    }

    /// Angle between the platform normal and vertical (radians)
    pub fn tilt(&self) -> f64 {
        tilt_magnitude(self.roll, self.pitch)
    }

    /// Subtract a roll/pitch bias, keeping yaw and timestamp
    pub fn corrected(&self, roll_offset: f64, pitch_offset: f64) -> Self {
        Self {
            roll: self.roll - roll_offset,
            pitch: self.pitch - pitch_offset,
            ..*self
        }
    }

    /// Sample age at `now_ms`; samples from the future count as fresh
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        let stamp_ms = self.timestamp * 1000.0;
        let age = now_ms as f64 - stamp_ms;
        if age <= 0.0 {
            0
        } else {
            age as u64
        }
    }
}

/// A provider of the latest orientation sample
pub trait OrientationSource {
    /// Most recent sample, or `None` if nothing has been received yet
    fn latest(&self) -> Option<Orientation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age() {
        let sample = Orientation::new(0.0, 0.0, 0.0, 1.5);
        assert_eq!(sample.age_ms(1_500), 0);
        assert_eq!(sample.age_ms(2_100), 600);
        assert_eq!(sample.age_ms(1_000), 0);
    }

    #[test]
    fn test_corrected_keeps_yaw_and_timestamp() {
        let sample = Orientation::new(0.10, -0.05, 0.3, 2.0);
        let corrected = sample.corrected(0.02, -0.01);
        assert!((corrected.roll - 0.08).abs() < 1e-12);
        assert!((corrected.pitch + 0.04).abs() < 1e-12);
        assert_eq!(corrected.yaw, 0.3);
        assert_eq!(corrected.timestamp, 2.0);
    }

    #[test]
    fn test_tilt_in_degrees() {
        let sample = Orientation::from_degrees(0.3, 0.0, 0.0, 0.0);
        assert!((sample.tilt().to_degrees() - 0.3).abs() < 1e-9);
    }
}
