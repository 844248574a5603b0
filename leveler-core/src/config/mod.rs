//! Configuration types
//!
//! Board-agnostic configuration structures and the validated platform
//! geometry built from them.

pub mod geometry;
pub mod types;

pub use geometry::PlatformGeometry;
pub use types::*;
