//! CO2 level classification
//!
//! Maps a CO2 concentration onto the screen the monitor should show.

use crate::config::Thresholds;

/// Air quality band for a CO2 reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Co2Level {
    /// At or below the moderate threshold; normal screen
    Normal,
    /// Above moderate, at or below critical
    Moderate,
    /// Above the critical threshold
    Critical,
}

impl Co2Level {
    /// Classify a reading. Boundaries belong to the lower band.
    pub fn classify(co2_ppm: f32, thresholds: &Thresholds) -> Self {
        if co2_ppm > thresholds.critical_ppm {
            Co2Level::Critical
        } else if co2_ppm > thresholds.moderate_ppm {
            Co2Level::Moderate
        } else {
            Co2Level::Normal
        }
    }

    /// Whether this level is shown through the blinking warning screen
    pub fn is_warning(self) -> bool {
        self != Co2Level::Normal
    }

    /// First two warning lines for this level, `None` for `Normal`
    pub fn warning_text(self) -> Option<(&'static str, &'static str)> {
        use crate::messages::*;

        match self {
            Co2Level::Normal => None,
            Co2Level::Moderate => Some((MODERATE_WARNING, MODERATE_ADVICE)),
            Co2Level::Critical => Some((CRITICAL_WARNING, CRITICAL_ADVICE)),
        }
    }

    /// Threshold that was crossed to reach this level
    pub fn threshold(self, thresholds: &Thresholds) -> Option<f32> {
        match self {
            Co2Level::Normal => None,
            Co2Level::Moderate => Some(thresholds.moderate_ppm),
            Co2Level::Critical => Some(thresholds.critical_ppm),
        }
    }
}
