//! One complete set of measurements

/// Values shown on the normal screen, in display units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// CO2 concentration (ppm), after plausibility filtering
    pub co2_ppm: f32,
    /// SCD30 temperature (°C), after plausibility filtering
    pub temperature_scd_c: f32,
    /// BMP280 temperature (°C), unfiltered; NaN when the read failed
    pub temperature_bmp_c: f32,
    /// Relative humidity (%), after plausibility filtering
    pub humidity_percent: f32,
    /// Barometric pressure (hPa), unfiltered; NaN when the read failed
    pub pressure_hpa: f32,
}
