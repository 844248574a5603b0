//! Application configuration
//!
//! One TOML document with three sections:
//! - `[platform]`: geometry and actuator stroke
//! - `[leveling]`: controller limits and timeouts
//! - `[simulation]`: simulated actuators, ground slope and IMU errors
//!
//! Every section and field is optional; missing values take the defaults.

pub mod loader;

use serde::{Deserialize, Serialize};

use leveler_core::config::{LevelingConfig, PlatformConfig};
use leveler_drivers::actuator::SimActuatorConfig;

pub use loader::{load_config, parse_config, EMBEDDED_CONFIG};

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub platform: PlatformConfig,
    pub leveling: LevelingConfig,
    pub simulation: SimulationConfig,
}

/// Simulated platform settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Actuator travel speed (m/s)
    #[serde(alias = "actuatorSpeed")]
    pub actuator_speed: f64,
    /// Constant error on reported actuator lengths (m)
    #[serde(alias = "sensorOffset")]
    pub sensor_offset: f64,
    /// Physics and IMU sample interval (ms)
    #[serde(alias = "stepInterval")]
    pub step_interval: u32,
    /// Ground slope under the base (degrees)
    #[serde(alias = "groundRoll")]
    pub ground_roll: f64,
    #[serde(alias = "groundPitch")]
    pub ground_pitch: f64,
    /// IMU mounting error (degrees)
    #[serde(alias = "imuMountRoll")]
    pub imu_mount_roll: f64,
    #[serde(alias = "imuMountPitch")]
    pub imu_mount_pitch: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            actuator_speed: 0.02,
            sensor_offset: 0.0,
            step_interval: 20,
            ground_roll: 0.0,
            ground_pitch: 0.0,
            imu_mount_roll: 0.0,
            imu_mount_pitch: 0.0,
        }
    }
}

impl SimulationConfig {
    pub fn actuator_config(&self) -> SimActuatorConfig {
        SimActuatorConfig {
            speed: self.actuator_speed,
            sensor_offset: self.sensor_offset,
        }
    }
}
