//! Sensor traits
//!
//! Two capabilities are needed: an NDIR CO2 sensor that also reports
//! temperature and humidity, and a barometric pressure sensor.

/// Errors from sensor drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I2C transfer failed
    Bus,
    /// Checksum mismatch in a response word
    Crc,
    /// Device did not identify itself as expected
    NotDetected,
    /// Used before `begin` succeeded
    NotInitialized,
    /// Device refused a command or argument
    Rejected,
}

/// CO2 / temperature / humidity sensor (SCD30 class)
pub trait Co2Sensor {
    /// Bring the sensor into continuous measurement mode
    fn begin(&mut self) -> Result<(), SensorError>;

    /// Whether a new measurement is ready. Never blocks waiting for one.
    fn data_available(&mut self) -> Result<bool, SensorError>;

    /// CO2 concentration in ppm
    fn co2_ppm(&mut self) -> Result<f32, SensorError>;

    /// Temperature in °C
    fn temperature_c(&mut self) -> Result<f32, SensorError>;

    /// Relative humidity in %
    fn humidity_percent(&mut self) -> Result<f32, SensorError>;

    /// Recalibrate the zero point against a known CO2 concentration
    fn set_forced_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError>;
}

/// Pressure / temperature sensor (BMP280 class)
pub trait PressureSensor {
    /// Probe and configure the sensor at the given I2C address
    fn begin(&mut self, address: u8) -> Result<(), SensorError>;

    /// Temperature in °C
    fn temperature_c(&mut self) -> Result<f32, SensorError>;

    /// Pressure in Pa
    fn pressure_pa(&mut self) -> Result<f32, SensorError>;
}
