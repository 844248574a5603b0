//! Configuration loading
//!
//! Reads a TOML file when one is given, otherwise the default compiled into
//! the binary. The geometry is validated before the config is returned, so
//! a bad platform description stops the process at startup.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;

use leveler_core::config::{PlatformGeometry, PlatformVariant};

use super::AppConfig;

/// Embedded default configuration (validated by build.rs)
pub const EMBEDDED_CONFIG: &str = include_str!("../../leveler.toml");

/// Parse a TOML document
pub fn parse_config(text: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(text).context("invalid leveler configuration")?;
    if config.simulation.actuator_speed <= 0.0 || !config.simulation.actuator_speed.is_finite() {
        return Err(anyhow!("simulation.actuator_speed must be positive"));
    }
    if config.simulation.step_interval == 0 {
        return Err(anyhow!("simulation.step_interval must be positive"));
    }
    config
        .leveling
        .validate()
        .map_err(|e| anyhow!("invalid leveling settings: {e}"))?;
    Ok(config)
}

/// Load configuration and apply a variant override
pub fn load_config(path: Option<&Path>, variant: Option<PlatformVariant>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            parse_config(&text).with_context(|| format!("in {}", path.display()))?
        }
        None => {
            info!("Using embedded configuration");
            parse_config(EMBEDDED_CONFIG)?
        }
    };

    if let Some(variant) = variant {
        if config.platform.has_custom_layout() && variant != config.platform.variant {
            return Err(anyhow!(
                "cannot switch to {} with custom attachment points for {}",
                variant.name(),
                config.platform.variant.name()
            ));
        }
        config.platform.variant = variant;
    }

    config.geometry()?;
    Ok(config)
}

impl AppConfig {
    /// Validated geometry for the configured platform
    pub fn geometry(&self) -> Result<PlatformGeometry> {
        PlatformGeometry::from_config(&self.platform).map_err(|e| anyhow!("invalid platform geometry: {e}"))
    }
}
