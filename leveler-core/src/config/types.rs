//! Configuration type definitions
//!
//! These types are filled from the host configuration file. Field names are
//! snake_case; camelCase spellings are accepted as aliases when the `serde`
//! feature is enabled.

use heapless::Vec;

use crate::error::LevelError;
use crate::math::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum actuators on any supported platform
pub const MAX_ACTUATORS: usize = 6;

/// Platform kinematic variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlatformVariant {
    /// Three vertical actuators, roll/pitch/heave
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "tripod", alias = "Tripod"))]
    Tripod,
    /// Six actuators restricted to roll/pitch/heave
    #[cfg_attr(feature = "serde", serde(rename = "stewart_3dof", alias = "Stewart3DOF", alias = "stewart3dof"))]
    Stewart3Dof,
    /// Six actuators, full six degrees of freedom
    #[cfg_attr(feature = "serde", serde(rename = "stewart_6dof", alias = "Stewart6DOF", alias = "stewart6dof"))]
    Stewart6Dof,
}

impl PlatformVariant {
    pub const ALL: [PlatformVariant; 3] = [
        PlatformVariant::Tripod,
        PlatformVariant::Stewart3Dof,
        PlatformVariant::Stewart6Dof,
    ];

    /// Number of actuators (attachment pairs)
    pub const fn actuator_count(&self) -> usize {
        match self {
            PlatformVariant::Tripod => 3,
            PlatformVariant::Stewart3Dof | PlatformVariant::Stewart6Dof => 6,
        }
    }

    /// Whether yaw and lateral translation are honoured
    pub const fn full_dof(&self) -> bool {
        matches!(self, PlatformVariant::Stewart6Dof)
    }

    /// Canonical configuration name
    pub const fn name(&self) -> &'static str {
        match self {
            PlatformVariant::Tripod => "tripod",
            PlatformVariant::Stewart3Dof => "stewart_3dof",
            PlatformVariant::Stewart6Dof => "stewart_6dof",
        }
    }

    /// Parse a variant name, accepting a few common spellings
    pub fn from_name(name: &str) -> Option<Self> {
        let matches = |candidates: &[&str]| candidates.iter().any(|c| c.eq_ignore_ascii_case(name));

        if matches(&["tripod", "3point", "three_point"]) {
            Some(PlatformVariant::Tripod)
        } else if matches(&["stewart_3dof", "stewart3dof", "stewart-3dof"]) {
            Some(PlatformVariant::Stewart3Dof)
        } else if matches(&["stewart_6dof", "stewart6dof", "stewart-6dof", "stewart"]) {
            Some(PlatformVariant::Stewart6Dof)
        } else {
            None
        }
    }
}

/// Platform dimensions and optional custom attachment layout
///
/// Lengths are in metres. When `base_points` and `platform_points` are empty
/// the standard layout for the variant is generated from the footprint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlatformConfig {
    pub variant: PlatformVariant,
    pub length: f64,
    pub width: f64,
    #[cfg_attr(feature = "serde", serde(alias = "minHeight"))]
    pub min_height: f64,
    #[cfg_attr(feature = "serde", serde(alias = "maxHeight"))]
    pub max_height: f64,
    #[cfg_attr(feature = "serde", serde(alias = "actuatorStroke"))]
    pub actuator_stroke: f64,
    /// Custom base attachment points (fixed frame)
    #[cfg_attr(feature = "serde", serde(alias = "basePoints"))]
    pub base_points: Vec<Vec3, MAX_ACTUATORS>,
    /// Custom platform attachment points in the neutral pose
    #[cfg_attr(feature = "serde", serde(alias = "platformPoints"))]
    pub platform_points: Vec<Vec3, MAX_ACTUATORS>,
}

impl Default for PlatformConfig {
    /// A queen-size bed deck on a tripod
    fn default() -> Self {
        Self {
            variant: PlatformVariant::Tripod,
            length: 1.83,
            width: 1.22,
            min_height: 0.3,
            max_height: 0.7,
            actuator_stroke: 0.4,
            base_points: Vec::new(),
            platform_points: Vec::new(),
        }
    }
}

impl PlatformConfig {
    /// Default dimensions for the given variant
    pub fn for_variant(variant: PlatformVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn has_custom_layout(&self) -> bool {
        !self.base_points.is_empty() || !self.platform_points.is_empty()
    }
}

/// Leveling controller tuning
///
/// Angles are in degrees, times in milliseconds, lengths in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LevelingConfig {
    /// Largest platform tilt the safety monitor accepts
    #[cfg_attr(feature = "serde", serde(alias = "maxTiltCompensation"))]
    pub max_tilt_compensation: f64,
    /// Auto-level only corrects tilt above this magnitude
    #[cfg_attr(feature = "serde", serde(alias = "autoLevelDeadband"))]
    pub auto_level_deadband: f64,
    /// Manual leveling reports "already level" below this magnitude
    #[cfg_attr(feature = "serde", serde(alias = "levelThreshold"))]
    pub level_threshold: f64,
    /// Largest roll or pitch change commanded by one cycle
    #[cfg_attr(feature = "serde", serde(alias = "maxCorrectionStep"))]
    pub max_correction_step: f64,
    #[cfg_attr(feature = "serde", serde(alias = "controlTickInterval"))]
    pub control_tick_interval: u32,
    /// Deadline for a command set to reach its targets
    #[cfg_attr(feature = "serde", serde(alias = "actuatorTimeout"))]
    pub actuator_timeout: u32,
    /// Silence after which an actuator is faulted
    #[cfg_attr(feature = "serde", serde(alias = "feedbackTimeout"))]
    pub feedback_timeout: u32,
    /// Distance from target counted as arrived
    #[cfg_attr(feature = "serde", serde(alias = "feedbackTolerance"))]
    pub feedback_tolerance: f64,
    /// Orientation samples older than this are stale
    #[cfg_attr(feature = "serde", serde(alias = "orientationTimeout"))]
    pub orientation_timeout: u32,
    #[cfg_attr(feature = "serde", serde(alias = "homingTimeout"))]
    pub homing_timeout: u32,
    /// No progress toward a target for this long is a stall
    #[cfg_attr(feature = "serde", serde(alias = "stallTimeout"))]
    pub stall_timeout: u32,
    /// Platform height above `min_height` held while leveling
    ///
    /// `None` selects half of the height range.
    #[cfg_attr(feature = "serde", serde(alias = "levelingHeight"))]
    pub leveling_height: Option<f64>,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            max_tilt_compensation: 15.0,
            auto_level_deadband: 0.5,
            level_threshold: 0.1,
            max_correction_step: 5.0,
            control_tick_interval: 100,
            actuator_timeout: 15_000,
            feedback_timeout: 1_000,
            feedback_tolerance: 0.001,
            orientation_timeout: 500,
            homing_timeout: 30_000,
            stall_timeout: 2_000,
            leveling_height: None,
        }
    }
}

impl LevelingConfig {
    /// Reject settings the controller cannot run with
    ///
    /// Angles must be finite, positive limits below 90°; timeouts non-zero.
    /// `leveling_height` depends on the geometry and is checked by the
    /// controller.
    pub fn validate(&self) -> Result<(), LevelError> {
        let limits = [
            ("max_tilt_compensation", self.max_tilt_compensation),
            ("max_correction_step", self.max_correction_step),
        ];
        for (field, value) in limits {
            if !(value > 0.0 && value < 90.0) {
                return Err(LevelError::InvalidConfig { field });
            }
        }

        let thresholds = [
            ("auto_level_deadband", self.auto_level_deadband),
            ("level_threshold", self.level_threshold),
        ];
        for (field, value) in thresholds {
            if !(value >= 0.0 && value < 90.0) {
                return Err(LevelError::InvalidConfig { field });
            }
        }

        if !(self.feedback_tolerance > 0.0 && self.feedback_tolerance.is_finite()) {
            return Err(LevelError::InvalidConfig {
                field: "feedback_tolerance",
            });
        }

        let timeouts = [
            ("control_tick_interval", self.control_tick_interval),
            ("actuator_timeout", self.actuator_timeout),
            ("feedback_timeout", self.feedback_timeout),
            ("orientation_timeout", self.orientation_timeout),
            ("homing_timeout", self.homing_timeout),
            ("stall_timeout", self.stall_timeout),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(LevelError::InvalidConfig { field });
            }
        }
        Ok(())
    }
}
