//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod control;
pub mod simulation;

pub use control::control_task;
pub use simulation::simulation_task;
