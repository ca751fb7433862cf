//! Persisted calibration flag
//!
//! A single byte under `StorageKey::CalibrationFlag` records whether the
//! forced recalibration has been performed on this device.

/// Flag value written after a successful forced recalibration
pub const CALIBRATION_DONE: u8 = 123;

/// Flag value written by the maintenance reset
pub const CALIBRATION_CLEARED: u8 = 0;

/// What the stored flag says about the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationStatus {
    /// Forced recalibration was already performed
    Done,
    /// Flag missing, cleared, or holding an unknown value
    Needed,
}

impl CalibrationStatus {
    /// Interpret the stored flag byte, `None` meaning nothing is stored
    pub fn from_flag(flag: Option<u8>) -> Self {
        match flag {
            Some(CALIBRATION_DONE) => CalibrationStatus::Done,
            _ => CalibrationStatus::Needed,
        }
    }

    pub fn is_done(self) -> bool {
        self == CalibrationStatus::Done
    }
}
