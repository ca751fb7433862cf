//! Configuration types
//!
//! Board-agnostic settings. The firmware bakes them in at build time
//! from `device.toml`.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
