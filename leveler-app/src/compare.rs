//! Platform variant comparison
//!
//! Solves a fixed table of test attitudes on every variant built from the
//! same footprint and reports the leg lengths each needs, the spread between
//! the longest and shortest leg, and whether the pose is reachable at all.

use std::fmt;

use leveler_core::config::{PlatformConfig, PlatformGeometry, PlatformVariant};
use leveler_core::error::LevelError;
use leveler_core::kinematics::{self, ActuatorLengths};
use leveler_core::math::Vec3;
use leveler_core::traits::Orientation;

/// Test attitudes: roll, pitch, yaw (degrees) and a label
pub const TEST_ANGLES: [(f64, f64, f64, &str); 10] = [
    (0.0, 0.0, 0.0, "Level"),
    (5.0, 0.0, 0.0, "5° roll"),
    (0.0, 5.0, 0.0, "5° pitch"),
    (5.0, 5.0, 0.0, "5° roll + 5° pitch"),
    (10.0, 0.0, 0.0, "10° roll"),
    (0.0, 10.0, 0.0, "10° pitch"),
    (10.0, 10.0, 0.0, "10° roll + 10° pitch"),
    (15.0, 0.0, 0.0, "15° roll (max)"),
    (0.0, 15.0, 0.0, "15° pitch (max)"),
    (10.0, 10.0, 15.0, "10° roll + 10° pitch + 15° yaw"),
];

/// Outcome for one variant at one attitude
#[derive(Debug, Clone, PartialEq)]
pub struct VariantResult {
    pub variant: PlatformVariant,
    pub outcome: Result<ActuatorLengths, LevelError>,
}

impl VariantResult {
    /// Longest minus shortest leg (m)
    pub fn spread(&self) -> Option<f64> {
        let lengths = self.outcome.as_ref().ok()?;
        let max = lengths.iter().copied().fold(f64::MIN, f64::max);
        let min = lengths.iter().copied().fold(f64::MAX, f64::min);
        Some(max - min)
    }
}

/// One row of the comparison table
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub label: &'static str,
    pub results: Vec<VariantResult>,
}

/// Full comparison for one footprint
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub config: PlatformConfig,
    pub height: f64,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonReport {
    /// Reachable attitudes for one variant
    pub fn valid_count(&self, variant: PlatformVariant) -> usize {
        self.results_for(variant).filter(|r| r.outcome.is_ok()).count()
    }

    /// Mean leg spread over the reachable attitudes (m)
    pub fn mean_spread(&self, variant: PlatformVariant) -> Option<f64> {
        let spreads: Vec<f64> = self.results_for(variant).filter_map(VariantResult::spread).collect();
        if spreads.is_empty() {
            return None;
        }
        Some(spreads.iter().sum::<f64>() / spreads.len() as f64)
    }

    fn results_for(&self, variant: PlatformVariant) -> impl Iterator<Item = &VariantResult> {
        self.rows
            .iter()
            .flat_map(|row| row.results.iter())
            .filter(move |r| r.variant == variant)
    }
}

/// Solve every test attitude on every variant
///
/// `height` is the platform height above neutral; custom attachment points
/// are ignored so every variant uses its standard layout.
pub fn compare(config: &PlatformConfig, height: f64) -> Result<ComparisonReport, LevelError> {
    let mut geometries = Vec::new();
    for variant in PlatformVariant::ALL {
        let mut variant_config = PlatformConfig::for_variant(variant);
        variant_config.length = config.length;
        variant_config.width = config.width;
        variant_config.min_height = config.min_height;
        variant_config.max_height = config.max_height;
        variant_config.actuator_stroke = config.actuator_stroke;
        geometries.push(PlatformGeometry::from_config(&variant_config)?);
    }

    let translation = Vec3::new(0.0, 0.0, height);
    let rows = TEST_ANGLES
        .iter()
        .map(|&(roll, pitch, yaw, label)| {
            let pose = Orientation::from_degrees(roll, pitch, yaw, 0.0);
            let results = geometries
                .iter()
                .map(|geometry| VariantResult {
                    variant: geometry.variant(),
                    outcome: kinematics::solve(geometry, &pose, translation),
                })
                .collect();
            ComparisonRow { label, results }
        })
        .collect();

    Ok(ComparisonReport {
        config: config.clone(),
        height,
        rows,
    })
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(72);
        writeln!(f, "{rule}")?;
        writeln!(f, "PLATFORM CONFIGURATION COMPARISON")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Platform: {:.0} mm x {:.0} mm, height {:.0}-{:.0} mm, stroke {:.0} mm, leveling at +{:.0} mm",
            self.config.length * 1000.0,
            self.config.width * 1000.0,
            self.config.min_height * 1000.0,
            self.config.max_height * 1000.0,
            self.config.actuator_stroke * 1000.0,
            self.height * 1000.0
        )?;

        for row in &self.rows {
            writeln!(f)?;
            writeln!(f, "{}", row.label)?;
            writeln!(f, "{}", "-".repeat(60))?;
            for result in &row.results {
                write!(f, "  {:<14}", result.variant.name())?;
                match (&result.outcome, result.spread()) {
                    (Ok(lengths), Some(spread)) => {
                        let mm: Vec<String> = lengths.iter().map(|l| format!("{:.1}", l * 1000.0)).collect();
                        writeln!(f, "[{}] mm, spread {:.1} mm", mm.join(", "), spread * 1000.0)?;
                    }
                    (Err(err), _) => writeln!(f, "INVALID: {err}")?,
                    (Ok(_), None) => writeln!(f)?,
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{rule}")?;
        for variant in PlatformVariant::ALL {
            write!(
                f,
                "  {:<14}{}/{} reachable",
                variant.name(),
                self.valid_count(variant),
                self.rows.len()
            )?;
            match self.mean_spread(variant) {
                Some(spread) => writeln!(f, ", mean spread {:.1} mm", spread * 1000.0)?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leveler_core::error::ErrorKind;

    fn report() -> ComparisonReport {
        let config = PlatformConfig::default();
        compare(&config, (config.max_height - config.min_height) / 2.0).unwrap()
    }

    #[test]
    fn covers_every_angle_and_variant() {
        let report = report();
        assert_eq!(report.rows.len(), TEST_ANGLES.len());
        for row in &report.rows {
            assert_eq!(row.results.len(), 3);
        }
    }

    #[test]
    fn level_row_has_zero_spread_on_tripod() {
        let report = report();
        let tripod = &report.rows[0].results[0];
        assert_eq!(tripod.variant, PlatformVariant::Tripod);
        assert!(tripod.spread().unwrap() < 1e-12);
    }

    #[test]
    fn yaw_only_changes_six_dof_lengths() {
        let config = PlatformConfig::default();
        let report = compare(&config, 0.2).unwrap();
        let without_yaw = &report.rows[6];
        let with_yaw = &report.rows[9];
        for (a, b) in without_yaw.results.iter().zip(&with_yaw.results) {
            match a.variant {
                PlatformVariant::Stewart6Dof => assert_ne!(a.outcome, b.outcome),
                _ => assert_eq!(a.outcome, b.outcome),
            }
        }
    }

    #[test]
    fn unreachable_poses_are_counted_invalid() {
        let config = PlatformConfig::default();
        // No room to tilt at the bottom of the stroke
        let report = compare(&config, 0.0).unwrap();
        assert_eq!(report.valid_count(PlatformVariant::Tripod), 1);
        let row = &report.rows[1];
        let err = row.results[0].outcome.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnreachablePose);
    }

    #[test]
    fn report_prints_summary() {
        let text = report().to_string();
        assert!(text.contains("PLATFORM CONFIGURATION COMPARISON"));
        assert!(text.contains("10° roll + 10° pitch + 15° yaw"));
        assert!(text.contains("SUMMARY"));
        assert!(text.contains("tripod"));
    }
}
