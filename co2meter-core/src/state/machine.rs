//! State machine definition
//!
//! Startup runs once (`Init` then `CalibrateCheck`); after that the monitor
//! cycles between `Poll` and `Render` forever. A failed startup ends in
//! `Halted`, which no event leaves.

use super::events::Event;

/// Monitor states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Bringing up display and sensors
    Init,
    /// Checking the persisted calibration flag, recalibrating if needed
    CalibrateCheck,
    /// Waiting for / fetching sensor data
    Poll,
    /// Drawing the screen for the current reading
    Render,
    /// Startup failed; outputs frozen until power cycle
    Halted(HaltReason),
}

/// Why the monitor halted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HaltReason {
    DisplayInit,
    PressureSensorInit,
    Co2SensorInit,
}

impl State {
    /// Check if startup has finished and the poll loop is running
    pub fn is_running(&self) -> bool {
        matches!(self, State::Poll | State::Render)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            (Init, InitComplete) => CalibrateCheck,
            (Init, InitFailed(reason)) => Halted(reason),

            (CalibrateCheck, CalibrationChecked) => Poll,

            (Poll, NewReading) | (Poll, CachedReading) => Render,
            (Poll, NoReading) => Poll,

            (Render, Rendered) => Poll,

            // Halted absorbs everything; anything else is ignored
            _ => self,
        }
    }
}
