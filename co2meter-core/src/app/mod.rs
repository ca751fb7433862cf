//! Monitor orchestration
//!
//! Ties the sensor manager, display manager and logger together into the
//! init / calibrate / poll / render cycle.

pub mod monitor;

pub use monitor::{Monitor, TickOutcome};

use crate::state::HaltReason;
use crate::traits::{DisplayError, SensorError};

/// Fatal startup failures. The device halts on any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    Display(DisplayError),
    PressureSensor(SensorError),
    Co2Sensor(SensorError),
}

impl InitError {
    /// Halt state entered for this failure
    pub fn halt_reason(self) -> HaltReason {
        match self {
            InitError::Display(_) => HaltReason::DisplayInit,
            InitError::PressureSensor(_) => HaltReason::PressureSensorInit,
            InitError::Co2Sensor(_) => HaltReason::Co2SensorInit,
        }
    }
}
