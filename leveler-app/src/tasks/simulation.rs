//! Simulated platform task
//!
//! Advances the actuator physics on a fixed interval and publishes what the
//! platform's IMU would read. Console requests reshape the simulated world
//! (ground slope, jammed actuators, link loss) between steps.

use embassy_time::{Duration, Instant, Ticker};
use log::{debug, info, warn};

use leveler_drivers::sensor::SimulatedTiltSensor;

use crate::channels::{SimRequest, ORIENTATION, SIM_REQUESTS};
use crate::sim;

/// Simulation loop; never returns
pub async fn simulation_task(mut sensor: SimulatedTiltSensor, step_ms: u32, epoch: Instant) {
    info!("Simulation task started: step {} ms", step_ms);

    let mut ticker = Ticker::every(Duration::from_millis(step_ms as u64));
    loop {
        ticker.next().await;

        while let Ok(request) = SIM_REQUESTS.try_receive() {
            apply(&mut sensor, request);
        }

        let Some(lengths) = sim::step(step_ms) else {
            continue;
        };
        let timestamp = epoch.elapsed().as_micros() as f64 / 1_000_000.0;
        match sensor.sample(&lengths, timestamp) {
            Ok(sample) => ORIENTATION.signal(sample),
            Err(err) => debug!("No IMU sample: {}", err),
        }
    }
}

fn apply(sensor: &mut SimulatedTiltSensor, request: SimRequest) {
    match request {
        SimRequest::Ground { roll, pitch } => {
            info!("Ground slope set to roll {:.2}°, pitch {:.2}°", roll, pitch);
            sensor.set_ground(roll.to_radians(), pitch.to_radians());
        }
        SimRequest::Stall { actuator, stalled } => {
            warn!("Actuator {} {}", actuator, if stalled { "jammed" } else { "freed" });
            sim::with_bank(|bank| bank.inject_stall(actuator, stalled));
        }
        SimRequest::Link { up } => {
            warn!("Actuator link {}", if up { "restored" } else { "lost" });
            sim::with_bank(|bank| bank.set_link_up(up));
        }
    }
}
