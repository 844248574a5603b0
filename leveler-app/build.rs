//! Build script for leveler-app
//!
//! Validates the embedded leveler.toml at compile time so a broken default
//! configuration never reaches the binary.

use std::fs;
use std::path::Path;

const VARIANTS: [&str; 3] = ["tripod", "stewart_3dof", "stewart_6dof"];

fn main() {
    validate_config();
}

/// Validate leveler.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=leveler.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("leveler.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read leveler.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in leveler.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_platform(&config, &mut errors);
    validate_leveling(&config, &mut errors);
    validate_simulation(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in leveler.toml                    ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a number that may be written as an integer or a float
fn number(table: &toml::value::Table, key: &str) -> Option<f64> {
    match table.get(key) {
        Some(toml::Value::Float(f)) => Some(*f),
        Some(toml::Value::Integer(i)) => Some(*i as f64),
        _ => None,
    }
}

fn validate_platform(config: &toml::Value, errors: &mut Vec<String>) {
    let platform = match config.get("platform") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[platform] must be a table".to_string());
            return;
        }
        None => {
            errors.push("Missing [platform] section".to_string());
            return;
        }
    };

    match platform.get("variant") {
        Some(toml::Value::String(v)) if VARIANTS.contains(&v.as_str()) => {}
        Some(_) => errors.push("[platform] variant must be tripod, stewart_3dof or stewart_6dof".to_string()),
        None => {}
    }

    for key in ["length", "width", "actuator_stroke"] {
        if let Some(value) = number(platform, key) {
            if value <= 0.0 {
                errors.push(format!("[platform] {} must be positive", key));
            }
        }
    }

    if let (Some(min), Some(max)) = (number(platform, "min_height"), number(platform, "max_height")) {
        if min > max {
            errors.push("[platform] min_height must not exceed max_height".to_string());
        }
    }
}

fn validate_leveling(config: &toml::Value, errors: &mut Vec<String>) {
    let leveling = match config.get("leveling") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    for key in ["max_tilt_compensation", "auto_level_deadband", "max_correction_step"] {
        if let Some(value) = number(leveling, key) {
            if !(0.0..=45.0).contains(&value) {
                errors.push(format!("[leveling] {} must be 0-45 degrees", key));
            }
        }
    }

    if let Some(toml::Value::Integer(tick)) = leveling.get("control_tick_interval") {
        if *tick <= 0 {
            errors.push("[leveling] control_tick_interval must be positive".to_string());
        }
    }
}

fn validate_simulation(config: &toml::Value, errors: &mut Vec<String>) {
    let simulation = match config.get("simulation") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    if let Some(speed) = number(simulation, "actuator_speed") {
        if speed <= 0.0 {
            errors.push("[simulation] actuator_speed must be positive".to_string());
        }
    }
    if let Some(toml::Value::Integer(step)) = simulation.get("step_interval") {
        if *step <= 0 {
            errors.push("[simulation] step_interval must be positive".to_string());
        }
    }
}
