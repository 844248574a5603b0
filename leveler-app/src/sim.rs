//! Simulated actuator link
//!
//! The simulated bank lives in a static so the simulation task can advance
//! its physics while the control task drives it through [`SimLink`]. Each
//! call takes the lock briefly and never awaits while holding it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use leveler_core::config::MAX_ACTUATORS;
use leveler_core::traits::{ActuatorFeedback, ActuatorTransport, TransportError};
use leveler_drivers::actuator::SimulatedActuatorBank;

/// Shared simulated actuator bank
static SIM_BANK: Mutex<CriticalSectionRawMutex, RefCell<Option<SimulatedActuatorBank>>> =
    Mutex::new(RefCell::new(None));

/// Install the bank and return a link to it
pub fn install(bank: SimulatedActuatorBank) -> SimLink {
    let count = bank.actuator_count();
    SIM_BANK.lock(|cell| *cell.borrow_mut() = Some(bank));
    SimLink { count }
}

/// Run `f` against the installed bank
pub fn with_bank<R>(f: impl FnOnce(&mut SimulatedActuatorBank) -> R) -> Option<R> {
    SIM_BANK.lock(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Advance the physics and return the new physical leg lengths
pub fn step(delta_ms: u32) -> Option<heapless::Vec<f64, MAX_ACTUATORS>> {
    with_bank(|bank| {
        bank.step(delta_ms);
        bank.physical_lengths()
    })
}

/// Transport handle owned by the controller
#[derive(Debug)]
pub struct SimLink {
    count: usize,
}

impl ActuatorTransport for SimLink {
    fn actuator_count(&self) -> usize {
        self.count
    }

    fn send_targets(&mut self, targets: &[f64]) -> Result<(), TransportError> {
        with_bank(|bank| bank.send_targets(targets)).unwrap_or(Err(TransportError::Disconnected))
    }

    fn home(&mut self, index: usize) -> Result<(), TransportError> {
        with_bank(|bank| bank.home(index)).unwrap_or(Err(TransportError::Disconnected))
    }

    fn halt(&mut self, index: usize) {
        with_bank(|bank| bank.halt(index));
    }

    fn halt_all(&mut self) {
        with_bank(|bank| bank.halt_all());
    }

    fn set_enabled(&mut self, enabled: bool) {
        with_bank(|bank| bank.set_enabled(enabled));
    }

    fn feedback(&mut self, index: usize) -> Option<ActuatorFeedback> {
        with_bank(|bank| bank.feedback(index)).flatten()
    }
}
