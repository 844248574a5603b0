//! Inter-task communication channels
//!
//! Defines the statics shared by the control loop, the simulated platform
//! and the console thread. Uses embassy-sync primitives with the
//! critical-section mutex so the console's OS thread can use them too.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use leveler_core::controller::{Command, StatusSnapshot};
use leveler_core::traits::Orientation;

/// Channel capacity for operator commands
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Channel capacity for simulation requests
const SIM_CHANNEL_SIZE: usize = 4;

/// Requests that change the simulated world rather than the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimRequest {
    /// Set the ground slope (degrees)
    Ground { roll: f64, pitch: f64 },
    /// Jam or free one actuator
    Stall { actuator: usize, stalled: bool },
    /// Take the actuator link down or bring it back
    Link { up: bool },
}

/// Latest IMU sample (updated by the simulation task)
///
/// Only the newest value matters; the control loop never waits on it.
pub static ORIENTATION: Signal<CriticalSectionRawMutex, Orientation> = Signal::new();

/// Operator commands other than emergency stop
pub static COMMANDS: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> = Channel::new();

/// Emergency stop request, serviced ahead of queued commands
pub static EMERGENCY_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Simulation requests from the console
pub static SIM_REQUESTS: Channel<CriticalSectionRawMutex, SimRequest, SIM_CHANNEL_SIZE> = Channel::new();

/// Latest status snapshot (published by the control task)
pub static STATUS: Mutex<CriticalSectionRawMutex, RefCell<Option<StatusSnapshot>>> = Mutex::new(RefCell::new(None));

/// Shutdown request
pub static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Copy of the latest published status
pub fn latest_status() -> Option<StatusSnapshot> {
    STATUS.lock(|status| status.borrow().clone())
}

/// Replace the published status
pub fn publish_status(snapshot: StatusSnapshot) {
    STATUS.lock(|status| *status.borrow_mut() = Some(snapshot));
}
