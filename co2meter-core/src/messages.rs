//! User-facing screen text

pub const CO2_MONITOR: &str = "CO2 Monitor";
pub const NORMAL_HEADLINE: &str = "CO2 Meter";
pub const WARNING_HEADLINE: &str = "WARNING!";

pub const CALIBRATION_CHECK: &str = "Calibration check...";
pub const CALIBRATION_NEEDED: &str = "Needs calibration";
pub const CALIBRATING: &str = "Calibrating...";
pub const PLACE_SENSOR: &str = "Place in fresh air";
pub const CALIBRATION_SUCCESS: &str = "Calibration success!";
pub const CALIBRATION_READY: &str = "Ready to use";
pub const CALIBRATION_FAILED: &str = "Calibration failed!";
pub const TRY_AGAIN: &str = "Please try again";

pub const MODERATE_WARNING: &str = "CO2 level moderate";
pub const MODERATE_ADVICE: &str = "Ventilate soon";
pub const CRITICAL_WARNING: &str = "CO2 level critical!";
pub const CRITICAL_ADVICE: &str = "Ventilate now";

pub const SENSOR_FAILURE: &str = "Sensor failure";
pub const HALTED: &str = "Device halted";

/// Fixed lines written by the display self-test
pub const DISPLAY_CHECK_LINES: [&str; 4] = [
    "Display check",
    "Line 2: small font",
    "Line 3: 0123456789",
    "Line 4: ABCDEFGHIJ",
];
