//! Control task
//!
//! Sole owner of the leveling controller. Each iteration waits for one of:
//! - an emergency stop (always serviced first)
//! - an operator command
//! - the next control tick
//!
//! The newest orientation sample is absorbed before acting, and a fresh
//! status snapshot is published afterwards.

use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Instant, Ticker};
use log::{debug, info, warn};

use leveler_core::controller::{CycleResult, LevelingController};
use leveler_core::error::FaultKind;
use leveler_core::state::State;
use leveler_core::traits::ActuatorTransport;

use crate::channels::{publish_status, COMMANDS, EMERGENCY_STOP, ORIENTATION};

/// Control loop; never returns
pub async fn control_task<T: ActuatorTransport>(mut controller: LevelingController<T>, epoch: Instant) {
    let interval = controller.config().control_tick_interval as u64;
    info!(
        "Control task started: {} actuators, tick {} ms, leveling height {:.3} m",
        controller.actuators().len(),
        interval,
        controller.leveling_height()
    );

    let mut ticker = Ticker::every(Duration::from_millis(interval));
    publish_status(controller.status());

    loop {
        let input = select3(EMERGENCY_STOP.wait(), COMMANDS.receive(), ticker.next()).await;
        let now_ms = epoch.elapsed().as_millis();
        absorb_orientation(&mut controller);

        let before = Observed::capture(&controller);
        match input {
            Either3::First(()) => {
                warn!("Emergency stop");
                controller.emergency_stop(now_ms);
            }
            Either3::Second(command) => {
                info!("Command: {}", command.name());
                if let Err(err) = controller.execute(command, now_ms) {
                    warn!("{} rejected: {}", command.name(), err);
                }
            }
            Either3::Third(()) => {
                if let Some(event) = controller.tick(now_ms) {
                    debug!("Event: {:?}", event);
                }
            }
        }
        before.report_changes(&controller);

        publish_status(controller.status());
    }
}

/// Hand the newest sample, if any, to the controller
fn absorb_orientation<T: ActuatorTransport>(controller: &mut LevelingController<T>) {
    if let Some(sample) = ORIENTATION.try_take() {
        controller.update_orientation(sample);
    }
}

/// Controller facts worth logging when they change
struct Observed {
    state: State,
    last_cycle: Option<CycleResult>,
    fault: Option<(u8, FaultKind)>,
}

impl Observed {
    fn capture<T: ActuatorTransport>(controller: &LevelingController<T>) -> Self {
        Self {
            state: controller.state(),
            last_cycle: controller.last_cycle(),
            fault: controller.actuators().first_fault(),
        }
    }

    fn report_changes<T: ActuatorTransport>(&self, controller: &LevelingController<T>) {
        let state = controller.state();
        if state != self.state {
            info!("State: {} -> {}", self.state.name(), state.name());
        }

        let fault = controller.actuators().first_fault();
        if fault != self.fault {
            if let Some((actuator, kind)) = fault {
                warn!("Actuator {} fault: {}", actuator, kind);
            }
        }

        let last_cycle = controller.last_cycle();
        if last_cycle != self.last_cycle {
            match last_cycle {
                Some(result) if result.is_success() => info!("Cycle: {}", result),
                Some(result) => warn!("Cycle: {}", result),
                None => {}
            }
        }
    }
}
