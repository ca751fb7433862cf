//! Board-agnostic core logic for the CO2 monitor firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (CO2 sensor, pressure sensor, display, clock)
//! - Sensor manager with plausibility filtering and the calibration workflow
//! - Display manager with screen layouts and warning blink timing
//! - Leveled console logger
//! - CO2 level classification
//! - Run-state machine and the monitor orchestrator
//! - I2C bus scan diagnostics
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod alert;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod display;
pub mod log;
pub mod messages;
pub mod sensors;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
