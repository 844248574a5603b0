//! Leveler - Active Platform Leveling
//!
//! Host binary. `leveler run` drives the leveling controller against a
//! simulated platform from an interactive console; `leveler compare` prints
//! the platform variant comparison report.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_futures::select::{select, Either};
use embassy_time::Instant;
use log::{error, info};

use leveler_core::config::PlatformVariant;
use leveler_core::controller::LevelingController;
use leveler_drivers::actuator::SimulatedActuatorBank;
use leveler_drivers::sensor::SimulatedTiltSensor;

use crate::config::{load_config, AppConfig};

mod channels;
mod compare;
mod config;
mod console;
mod sim;
mod status;
mod tasks;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Active platform leveling controller")]
struct Cli {
    /// Configuration file (TOML); the embedded default is used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Platform variant, overriding the configuration
    #[arg(long, global = true, value_parser = parse_variant)]
    variant: Option<PlatformVariant>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the controller against the simulated platform (default)
    Run {
        /// Initial ground roll (degrees)
        #[arg(long, allow_hyphen_values = true)]
        ground_roll: Option<f64>,

        /// Initial ground pitch (degrees)
        #[arg(long, allow_hyphen_values = true)]
        ground_pitch: Option<f64>,
    },
    /// Compare the platform variants over a table of test attitudes
    Compare {
        /// Height above neutral to solve at (m); defaults to the leveling height
        #[arg(long)]
        height: Option<f64>,
    },
}

fn parse_variant(name: &str) -> Result<PlatformVariant, String> {
    PlatformVariant::from_name(name).ok_or_else(|| format!("unknown variant '{name}' (tripod, stewart_3dof, stewart_6dof)"))
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = start(cli).await {
        error!("{err:#}");
        std::process::exit(1);
    }
    std::process::exit(0);
}

async fn start(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.variant)?;
    info!(
        "Platform: {} ({} actuators)",
        config.platform.variant.name(),
        config.platform.variant.actuator_count()
    );

    match cli.command.unwrap_or(Mode::Run {
        ground_roll: None,
        ground_pitch: None,
    }) {
        Mode::Compare { height } => run_compare(&config, height),
        Mode::Run {
            ground_roll,
            ground_pitch,
        } => {
            let mut config = config;
            if let Some(roll) = ground_roll {
                config.simulation.ground_roll = roll;
            }
            if let Some(pitch) = ground_pitch {
                config.simulation.ground_pitch = pitch;
            }
            run_simulation(config).await
        }
    }
}

fn run_compare(config: &AppConfig, height: Option<f64>) -> Result<()> {
    let height = height
        .or(config.leveling.leveling_height)
        .unwrap_or((config.platform.max_height - config.platform.min_height) / 2.0);
    let report = compare::compare(&config.platform, height).map_err(|e| anyhow!("comparison failed: {e}"))?;
    println!("{report}");
    Ok(())
}

async fn run_simulation(config: AppConfig) -> Result<()> {
    let geometry = config.geometry()?;
    let sim_config = &config.simulation;

    let link = sim::install(SimulatedActuatorBank::from_geometry(&geometry, sim_config.actuator_config()));
    let mut sensor = SimulatedTiltSensor::new(geometry.clone());
    sensor.set_ground(sim_config.ground_roll.to_radians(), sim_config.ground_pitch.to_radians());
    sensor.set_mount_bias(sim_config.imu_mount_roll.to_radians(), sim_config.imu_mount_pitch.to_radians());

    let controller = LevelingController::new(geometry, config.leveling, link)
        .map_err(|e| anyhow!("cannot start controller: {e}"))?;

    console::spawn().context("failed to start console")?;
    println!("{}", console::HELP);

    let epoch = Instant::now();
    let tasks = join(
        tasks::control_task(controller, epoch),
        tasks::simulation_task(sensor, sim_config.step_interval, epoch),
    );

    match select(tasks, channels::SHUTDOWN.wait()).await {
        Either::First(_) => Err(anyhow!("control loop exited")),
        Either::Second(()) => {
            info!("Shutting down");
            Ok(())
        }
    }
}
