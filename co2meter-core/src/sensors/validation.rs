//! Plausibility windows and last-valid fallback values
//!
//! The SCD30 occasionally returns garbage (zero CO2 right after power-up,
//! wild values after a bus glitch). Values outside the physical range of
//! the sensor are replaced with the last value that passed.

/// Upper bound of the SCD30 CO2 range (ppm)
pub const CO2_MAX_PPM: f32 = 10_000.0;

/// SCD30 operating temperature range (°C)
pub const TEMPERATURE_MIN_C: f32 = -40.0;
pub const TEMPERATURE_MAX_C: f32 = 85.0;

/// Upper bound of relative humidity (%)
pub const HUMIDITY_MAX_PERCENT: f32 = 100.0;

/// Fallbacks used until the first plausible value arrives
pub const DEFAULT_CO2_PPM: f32 = 400.0;
pub const DEFAULT_TEMPERATURE_C: f32 = 20.0;
pub const DEFAULT_HUMIDITY_PERCENT: f32 = 50.0;

/// Filtered quantities reported by the CO2 sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Quantity {
    Co2,
    Temperature,
    Humidity,
}

impl Quantity {
    /// Whether `value` lies inside the plausibility window. NaN never does.
    pub fn is_plausible(self, value: f32) -> bool {
        match self {
            Quantity::Co2 => value > 0.0 && value <= CO2_MAX_PPM,
            Quantity::Temperature => (TEMPERATURE_MIN_C..=TEMPERATURE_MAX_C).contains(&value),
            Quantity::Humidity => value > 0.0 && value <= HUMIDITY_MAX_PERCENT,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Quantity::Co2 => "CO2",
            Quantity::Temperature => "Temperature",
            Quantity::Humidity => "Humidity",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Quantity::Co2 => "ppm",
            Quantity::Temperature => "C",
            Quantity::Humidity => "%",
        }
    }
}

/// Result of passing a raw value through the filter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filtered {
    /// Raw value was plausible and is now the cached value
    Accepted(f32),
    /// Raw value was rejected; carries the cached value instead
    Substituted(f32),
}

impl Filtered {
    pub fn value(self) -> f32 {
        match self {
            Filtered::Accepted(v) | Filtered::Substituted(v) => v,
        }
    }
}

/// Last plausible value per quantity
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FallbackCache {
    co2_ppm: f32,
    temperature_c: f32,
    humidity_percent: f32,
}

impl Default for FallbackCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackCache {
    pub const fn new() -> Self {
        Self {
            co2_ppm: DEFAULT_CO2_PPM,
            temperature_c: DEFAULT_TEMPERATURE_C,
            humidity_percent: DEFAULT_HUMIDITY_PERCENT,
        }
    }

    /// Currently cached value
    pub fn get(&self, quantity: Quantity) -> f32 {
        match quantity {
            Quantity::Co2 => self.co2_ppm,
            Quantity::Temperature => self.temperature_c,
            Quantity::Humidity => self.humidity_percent,
        }
    }

    fn slot(&mut self, quantity: Quantity) -> &mut f32 {
        match quantity {
            Quantity::Co2 => &mut self.co2_ppm,
            Quantity::Temperature => &mut self.temperature_c,
            Quantity::Humidity => &mut self.humidity_percent,
        }
    }

    /// Accept `raw` if plausible, otherwise fall back to the cache
    ///
    /// The cache is only written on acceptance.
    pub fn filter(&mut self, quantity: Quantity, raw: f32) -> Filtered {
        if quantity.is_plausible(raw) {
            *self.slot(quantity) = raw;
            Filtered::Accepted(raw)
        } else {
            Filtered::Substituted(self.get(quantity))
        }
    }

    /// Value to use when the driver could not produce a reading at all
    pub fn fallback(&self, quantity: Quantity) -> Filtered {
        Filtered::Substituted(self.get(quantity))
    }
}
