//! Device configuration
//!
//! `DEVICE_CONFIG` is generated by build.rs from device.toml, which has
//! already been validated by the time this compiles.

use co2meter_core::config::{CalibrationConfig, IdlePolicy, MonitorConfig, Thresholds};
use co2meter_core::log::LogLevel;

include!(concat!(env!("OUT_DIR"), "/device_config.rs"));
