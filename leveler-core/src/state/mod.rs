//! State machine for the leveling controller
//!
//! Defines the authoritative lifecycle of the controller.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::State;
