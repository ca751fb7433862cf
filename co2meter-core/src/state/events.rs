//! Events that trigger state transitions

use super::machine::HaltReason;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Startup events
    /// Display and both sensors came up
    InitComplete,
    /// A peripheral failed to start
    InitFailed(HaltReason),
    /// The one-time calibration check finished, whatever its outcome
    CalibrationChecked,

    // Loop events
    /// The CO2 sensor delivered a new measurement
    NewReading,
    /// No new measurement, last reading is rendered again
    CachedReading,
    /// Nothing to render this tick
    NoReading,
    /// The screen for this tick was drawn
    Rendered,
}
