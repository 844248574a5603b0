//! Platform geometry
//!
//! Attachment points are expressed in a base frame with z up. The platform's
//! neutral pose sits at `min_height` with every actuator fully retracted, so
//! the distance between a base point and its platform point in that pose is
//! the actuator's retracted length.

use heapless::Vec;

use super::types::{PlatformConfig, PlatformVariant, MAX_ACTUATORS};
use crate::error::{GeometryFault, LevelError};
use crate::math::Vec3;

/// Shortest leg accepted as non-degenerate (m)
const MIN_LEG_LENGTH: f64 = 1e-6;

/// Validated, immutable platform geometry
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGeometry {
    variant: PlatformVariant,
    length: f64,
    width: f64,
    min_height: f64,
    max_height: f64,
    actuator_stroke: f64,
    base_points: Vec<Vec3, MAX_ACTUATORS>,
    platform_points: Vec<Vec3, MAX_ACTUATORS>,
    centroid: Vec3,
    retracted: Vec<f64, MAX_ACTUATORS>,
}

impl PlatformGeometry {
    /// Build geometry from configuration
    ///
    /// Uses the custom layout when one is configured, otherwise the
    /// standard layout for the variant.
    pub fn from_config(config: &PlatformConfig) -> Result<Self, LevelError> {
        if config.has_custom_layout() {
            return Self::with_points(config, &config.base_points, &config.platform_points);
        }

        validate_dimensions(config)?;
        let (base, platform) = standard_layout(config);
        Self::with_points(config, &base, &platform)
    }

    /// Build geometry from explicit attachment points
    ///
    /// `base` and `platform` must each hold exactly one point per actuator of
    /// the configured variant.
    pub fn with_points(config: &PlatformConfig, base: &[Vec3], platform: &[Vec3]) -> Result<Self, LevelError> {
        validate_dimensions(config)?;

        let expected = config.variant.actuator_count();
        if base.len() != expected || platform.len() != expected {
            return Err(GeometryFault::PointCountMismatch {
                expected: expected as u8,
                base: base.len().min(u8::MAX as usize) as u8,
                platform: platform.len().min(u8::MAX as usize) as u8,
            }
            .into());
        }

        let mut base_points = Vec::new();
        let mut platform_points = Vec::new();
        let mut retracted = Vec::new();
        let mut sum = Vec3::ZERO;

        for (&b, &p) in base.iter().zip(platform) {
            if !b.is_finite() || !p.is_finite() {
                return Err(GeometryFault::DegenerateLayout.into());
            }
            let leg = (p - b).norm();
            if leg < MIN_LEG_LENGTH {
                return Err(GeometryFault::DegenerateLayout.into());
            }
            let _ = base_points.push(b);
            let _ = platform_points.push(p);
            let _ = retracted.push(leg);
            sum = sum + p;
        }

        Ok(Self {
            variant: config.variant,
            length: config.length,
            width: config.width,
            min_height: config.min_height,
            max_height: config.max_height,
            actuator_stroke: config.actuator_stroke,
            base_points,
            platform_points,
            centroid: sum * (1.0 / expected as f64),
            retracted,
        })
    }

    pub fn variant(&self) -> PlatformVariant {
        self.variant
    }

    pub fn actuator_count(&self) -> usize {
        self.base_points.len()
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn min_height(&self) -> f64 {
        self.min_height
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Vertical range the platform can be raised through (m)
    pub fn height_range(&self) -> f64 {
        self.max_height - self.min_height
    }

    pub fn actuator_stroke(&self) -> f64 {
        self.actuator_stroke
    }

    pub fn base_points(&self) -> &[Vec3] {
        &self.base_points
    }

    /// Platform attachment points in the neutral pose
    pub fn platform_points(&self) -> &[Vec3] {
        &self.platform_points
    }

    /// Centroid of the neutral platform points, the rotation pivot
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Per-actuator length in the neutral (fully retracted) pose
    pub fn retracted_lengths(&self) -> &[f64] {
        &self.retracted
    }

    /// Re-check the attachment point invariant
    pub fn check_point_counts(&self) -> Result<(), LevelError> {
        let expected = self.variant.actuator_count();
        if self.base_points.len() != expected || self.platform_points.len() != expected {
            return Err(GeometryFault::PointCountMismatch {
                expected: expected as u8,
                base: self.base_points.len() as u8,
                platform: self.platform_points.len() as u8,
            }
            .into());
        }
        Ok(())
    }
}

fn validate_dimensions(config: &PlatformConfig) -> Result<(), LevelError> {
    let positive = |v: f64| v.is_finite() && v > 0.0;

    if !positive(config.length)
        || !positive(config.width)
        || !positive(config.min_height)
        || !positive(config.max_height)
        || !positive(config.actuator_stroke)
    {
        return Err(GeometryFault::InvalidDimension.into());
    }
    if config.min_height >= config.max_height {
        return Err(GeometryFault::InvertedHeightRange.into());
    }
    Ok(())
}

type Points = Vec<Vec3, MAX_ACTUATORS>;

/// Standard attachment layout for a variant
fn standard_layout(config: &PlatformConfig) -> (Points, Points) {
    match config.variant {
        PlatformVariant::Tripod => tripod_layout(config),
        PlatformVariant::Stewart3Dof | PlatformVariant::Stewart6Dof => hexagon_layout(config),
    }
}

/// Triangle: one point on the long axis, two at the far corners
fn tripod_layout(config: &PlatformConfig) -> (Points, Points) {
    let (l, w) = (config.length, config.width);
    let footprint = [(l / 3.0, 0.0), (-l / 6.0, w / 2.0), (-l / 6.0, -w / 2.0)];

    let mut base = Vec::new();
    let mut platform = Vec::new();
    for (x, y) in footprint {
        let _ = base.push(Vec3::new(x, y, 0.0));
        let _ = platform.push(Vec3::new(x, y, config.min_height));
    }
    (base, platform)
}

/// Hexagon: platform ring is smaller and rotated 30° against the base ring
fn hexagon_layout(config: &PlatformConfig) -> (Points, Points) {
    let base_radius = config.length.min(config.width) / 3.0;
    let platform_radius = base_radius * 0.8;

    let mut base = Vec::new();
    let mut platform = Vec::new();
    for i in 0..6 {
        let base_angle = (60.0 * i as f64 + 30.0).to_radians();
        let platform_angle = base_angle + 30.0_f64.to_radians();
        let _ = base.push(Vec3::new(
            base_radius * libm::cos(base_angle),
            base_radius * libm::sin(base_angle),
            0.0,
        ));
        let _ = platform.push(Vec3::new(
            platform_radius * libm::cos(platform_angle),
            platform_radius * libm::sin(platform_angle),
            config.min_height,
        ));
    }
    (base, platform)
}
