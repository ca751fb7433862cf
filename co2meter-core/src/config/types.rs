//! Configuration type definitions
//!
//! These types represent the monitor configuration: warning thresholds,
//! timing, calibration parameters and bus addresses.

use crate::log::LogLevel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default warning thresholds (ppm)
pub const DEFAULT_MODERATE_PPM: f32 = 1000.0;
pub const DEFAULT_CRITICAL_PPM: f32 = 2000.0;

/// Default timing (ms)
pub const DEFAULT_BLINK_INTERVAL_MS: u32 = 500;
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 2000;
pub const DEFAULT_MESSAGE_HOLD_MS: u32 = 5000;

/// Fresh-air reference concentration used for forced recalibration
pub const FRESH_AIR_CO2_PPM: u16 = 400;

/// SCD30 accepts forced recalibration references in this range
pub const MIN_REFERENCE_PPM: u16 = 400;
pub const MAX_REFERENCE_PPM: u16 = 2000;

/// Default I2C addresses
pub const DEFAULT_PRESSURE_SENSOR_ADDRESS: u8 = 0x76;
pub const DEFAULT_DISPLAY_ADDRESS: u8 = 0x3C;

/// CO2 warning thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Thresholds {
    /// Readings above this are a moderate warning
    pub moderate_ppm: f32,
    /// Readings above this are a critical warning
    pub critical_ppm: f32,
}

impl Thresholds {
    pub const DEFAULT: Self = Self {
        moderate_ppm: DEFAULT_MODERATE_PPM,
        critical_ppm: DEFAULT_CRITICAL_PPM,
    };
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Forced recalibration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalibrationConfig {
    /// Reference concentration the sensor is recalibrated against (ppm)
    pub reference_ppm: u16,
    /// How long the success/failure message stays on screen (ms)
    pub message_hold_ms: u32,
}

impl CalibrationConfig {
    pub const DEFAULT: Self = Self {
        reference_ppm: FRESH_AIR_CO2_PPM,
        message_hold_ms: DEFAULT_MESSAGE_HOLD_MS,
    };
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What the loop renders when the sensor has no new sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IdlePolicy {
    /// Re-render the last reading so warnings keep blinking
    #[default]
    RenderCached,
    /// Leave the screen untouched
    Skip,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Console log threshold
    pub log_level: LogLevel,
    pub thresholds: Thresholds,
    /// Time between warning screen toggles (ms)
    pub blink_interval_ms: u32,
    /// Delay between loop iterations (ms)
    pub poll_interval_ms: u32,
    pub calibration: CalibrationConfig,
    pub idle_policy: IdlePolicy,
    /// BMP280 address, 0x76 or 0x77 depending on SDO strapping
    pub pressure_sensor_address: u8,
    /// SSD1306 address
    pub display_address: u8,
}

impl MonitorConfig {
    pub const DEFAULT: Self = Self {
        log_level: LogLevel::Info,
        thresholds: Thresholds::DEFAULT,
        blink_interval_ms: DEFAULT_BLINK_INTERVAL_MS,
        poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        calibration: CalibrationConfig::DEFAULT,
        idle_policy: IdlePolicy::RenderCached,
        pressure_sensor_address: DEFAULT_PRESSURE_SENSOR_ADDRESS,
        display_address: DEFAULT_DISPLAY_ADDRESS,
    };

    /// Check the configuration for values the monitor cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.moderate_ppm.is_finite() && t.critical_ppm.is_finite())
            || t.moderate_ppm <= 0.0
        {
            return Err(ConfigError::ThresholdNotPositive);
        }
        if t.moderate_ppm >= t.critical_ppm {
            return Err(ConfigError::ThresholdOrder);
        }
        if self.blink_interval_ms == 0 || self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !(MIN_REFERENCE_PPM..=MAX_REFERENCE_PPM).contains(&self.calibration.reference_ppm) {
            return Err(ConfigError::ReferenceOutOfRange);
        }
        if !is_device_address(self.pressure_sensor_address)
            || !is_device_address(self.display_address)
        {
            return Err(ConfigError::InvalidAddress);
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Non-reserved 7-bit I2C address
fn is_device_address(address: u8) -> bool {
    (0x08..=0x77).contains(&address)
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A threshold is zero, negative or not finite
    ThresholdNotPositive,
    /// Moderate threshold is not below the critical one
    ThresholdOrder,
    /// Blink or poll interval is zero
    ZeroInterval,
    /// Recalibration reference outside what the sensor accepts
    ReferenceOutOfRange,
    /// Bus address outside the usable 7-bit range
    InvalidAddress,
}

impl ConfigError {
    pub const fn description(self) -> &'static str {
        match self {
            ConfigError::ThresholdNotPositive => "thresholds must be positive and finite",
            ConfigError::ThresholdOrder => "moderate_ppm must be below critical_ppm",
            ConfigError::ZeroInterval => "blink and poll intervals must be non-zero",
            ConfigError::ReferenceOutOfRange => "calibration reference must be 400-2000 ppm",
            ConfigError::InvalidAddress => "I2C addresses must be within 0x08-0x77",
        }
    }
}
