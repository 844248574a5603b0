//! Simulated tilt sensor
//!
//! Derives the platform's attitude from actuator lengths with forward
//! kinematics, then places it on sloped ground. The result is what a
//! platform-mounted IMU would read, including an optional mounting bias.

use leveler_core::config::PlatformGeometry;
use leveler_core::error::LevelError;
use leveler_core::kinematics::estimate_pose;
use leveler_core::math::{Mat3, Vec3};
use leveler_core::traits::{Orientation, OrientationSource};

/// Tilt sensor riding on a simulated platform
#[derive(Debug, Clone)]
pub struct SimulatedTiltSensor {
    geometry: PlatformGeometry,
    /// Ground slope under the base (roll, pitch in radians)
    ground: (f64, f64),
    /// Sensor mounting error added to every reading (radians)
    mount_bias: (f64, f64),
    latest: Option<Orientation>,
}

impl SimulatedTiltSensor {
    pub fn new(geometry: PlatformGeometry) -> Self {
        Self {
            geometry,
            ground: (0.0, 0.0),
            mount_bias: (0.0, 0.0),
            latest: None,
        }
    }

    pub fn ground(&self) -> (f64, f64) {
        self.ground
    }

    /// Set the ground slope (radians)
    pub fn set_ground(&mut self, roll: f64, pitch: f64) {
        self.ground = (roll, pitch);
    }

    /// Set the sensor's mounting error (radians)
    pub fn set_mount_bias(&mut self, roll: f64, pitch: f64) {
        self.mount_bias = (roll, pitch);
    }

    /// True platform attitude relative to gravity, without sensor bias
    pub fn world_attitude(&self, lengths: &[f64]) -> Result<Orientation, LevelError> {
        let estimate = estimate_pose(&self.geometry, lengths)?;
        let ground = Mat3::rot_x(self.ground.0) * Mat3::rot_y(self.ground.1);
        let platform = Mat3::rot_x(estimate.roll) * Mat3::rot_y(estimate.pitch);
        let normal = ground * platform * Vec3::new(0.0, 0.0, 1.0);

        let roll = libm::atan2(-normal.y, normal.z);
        let pitch = libm::atan2(normal.x, libm::hypot(normal.y, normal.z));
        Ok(Orientation::attitude(roll, pitch))
    }

    /// Take a reading for the given physical leg lengths
    pub fn sample(&mut self, lengths: &[f64], timestamp: f64) -> Result<Orientation, LevelError> {
        let attitude = self.world_attitude(lengths)?;
        let reading = Orientation::new(
            attitude.roll + self.mount_bias.0,
            attitude.pitch + self.mount_bias.1,
            0.0,
            timestamp,
        );
        self.latest = Some(reading);
        Ok(reading)
    }
}

impl OrientationSource for SimulatedTiltSensor {
    fn latest(&self) -> Option<Orientation> {
        self.latest
    }
}
