//! Sensirion SCD30 CO2 sensor (I2C mode)
//!
//! The SCD30 measures CO2 with an NDIR cell and carries its own
//! temperature and humidity sensor for compensation.
//!
//! # I2C Protocol
//!
//! - Address 0x61, 100 kHz max, clock stretching
//! - Commands are 16-bit big-endian, optionally followed by one 16-bit
//!   argument and its CRC
//! - Every 16-bit word the sensor returns is followed by a CRC8
//!   (polynomial 0x31, init 0xFF)
//! - A read is a command write, a pause of at least 3 ms, then the read
//!
//! Measurements are three big-endian IEEE754 floats, each split into two
//! CRC-protected words.

use co2meter_core::traits::{Co2Sensor, SensorError};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::sensor_bus_error;

/// Fixed I2C address
pub const SCD30_ADDRESS: u8 = 0x61;

/// SCD30 commands
pub mod cmd {
    /// Start continuous measurement; argument is ambient pressure in mbar (0 = off)
    pub const START_CONTINUOUS: u16 = 0x0010;
    pub const STOP_CONTINUOUS: u16 = 0x0104;
    /// Argument: interval in seconds (2..=1800)
    pub const SET_MEASUREMENT_INTERVAL: u16 = 0x4600;
    pub const GET_DATA_READY: u16 = 0x0202;
    pub const READ_MEASUREMENT: u16 = 0x0300;
    /// Argument: 1 enables automatic self-calibration, 0 disables it
    pub const AUTO_SELF_CALIBRATION: u16 = 0x5306;
    /// Argument: reference CO2 concentration in ppm (400..=2000)
    pub const FORCED_RECALIBRATION: u16 = 0x5204;
    pub const FIRMWARE_VERSION: u16 = 0xD100;
    pub const SOFT_RESET: u16 = 0xD304;
}

/// Valid forced recalibration references (ppm)
pub const FRC_RANGE: core::ops::RangeInclusive<u16> = 400..=2000;

/// Pause between a command and the following read
const READ_DELAY_US: u32 = 3_000;

/// Driver configuration applied by `begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scd30Config {
    /// Seconds between measurements
    pub measurement_interval_s: u16,
    /// Ambient pressure compensation (mbar), 0 disables it
    pub ambient_pressure_mbar: u16,
    /// Let the sensor recalibrate itself against the weekly minimum
    pub auto_self_calibration: bool,
}

impl Default for Scd30Config {
    fn default() -> Self {
        Self {
            measurement_interval_s: 2,
            ambient_pressure_mbar: 0,
            auto_self_calibration: false,
        }
    }
}

/// One decoded measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub co2_ppm: f32,
    pub temperature_c: f32,
    pub humidity_percent: f32,
}

/// CRC8 used by Sensirion sensors
///
/// Polynomial 0x31 (x^8 + x^5 + x^4 + 1), initial value 0xFF, no final XOR.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0xFFu8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x31;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Command frame carrying one argument word
pub fn command_with_arg(command: u16, arg: u16) -> [u8; 5] {
    let [c0, c1] = command.to_be_bytes();
    let [a0, a1] = arg.to_be_bytes();
    [c0, c1, a0, a1, crc8(&[a0, a1])]
}

/// Decode a word + CRC triple
pub fn parse_word(bytes: &[u8; 3]) -> Result<u16, SensorError> {
    if crc8(&bytes[..2]) != bytes[2] {
        return Err(SensorError::Crc);
    }
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Decode the 18-byte measurement response
pub fn parse_measurement(bytes: &[u8; 18]) -> Result<Measurement, SensorError> {
    let mut values = [0f32; 3];
    for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(6)) {
        if crc8(&chunk[0..2]) != chunk[2] || crc8(&chunk[3..5]) != chunk[5] {
            return Err(SensorError::Crc);
        }
        *value = f32::from_be_bytes([chunk[0], chunk[1], chunk[3], chunk[4]]);
    }

    Ok(Measurement {
        co2_ppm: values[0],
        temperature_c: values[1],
        humidity_percent: values[2],
    })
}

/// Index into the per-field freshness flags
#[derive(Clone, Copy)]
enum Field {
    Co2 = 0,
    Temperature = 1,
    Humidity = 2,
}

/// SCD30 driver
///
/// The three getters share one measurement: the first getter to see a
/// value it has already returned triggers a new read, so calling all three
/// once per data-ready cycle costs a single bus transaction.
pub struct Scd30<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Scd30Config,
    initialized: bool,
    measurement: Measurement,
    fresh: [bool; 3],
}

impl<I2C: I2c, D: DelayNs> Scd30<I2C, D> {
    pub fn new(i2c: I2C, delay: D, config: Scd30Config) -> Self {
        Self {
            i2c,
            delay,
            config,
            initialized: false,
            measurement: Measurement {
                co2_ppm: 0.0,
                temperature_c: 0.0,
                humidity_percent: 0.0,
            },
            fresh: [false; 3],
        }
    }

    /// Firmware version as (major, minor)
    pub fn firmware_version(&mut self) -> Result<(u8, u8), SensorError> {
        let [major, minor] = self.read_word(cmd::FIRMWARE_VERSION)?.to_be_bytes();
        Ok((major, minor))
    }

    pub fn set_measurement_interval(&mut self, seconds: u16) -> Result<(), SensorError> {
        self.send_with_arg(cmd::SET_MEASUREMENT_INTERVAL, seconds)
    }

    pub fn set_auto_self_calibration(&mut self, enabled: bool) -> Result<(), SensorError> {
        self.send_with_arg(cmd::AUTO_SELF_CALIBRATION, enabled as u16)
    }

    pub fn start_continuous(&mut self, ambient_pressure_mbar: u16) -> Result<(), SensorError> {
        self.send_with_arg(cmd::START_CONTINUOUS, ambient_pressure_mbar)
    }

    pub fn stop_continuous(&mut self) -> Result<(), SensorError> {
        self.send(cmd::STOP_CONTINUOUS)
    }

    pub fn soft_reset(&mut self) -> Result<(), SensorError> {
        self.initialized = false;
        self.send(cmd::SOFT_RESET)
    }

    /// Read a fresh measurement and mark all three values unreported
    pub fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        self.send(cmd::READ_MEASUREMENT)?;
        self.delay.delay_us(READ_DELAY_US);

        let mut buf = [0u8; 18];
        self.i2c
            .read(SCD30_ADDRESS, &mut buf)
            .map_err(sensor_bus_error)?;
        self.measurement = parse_measurement(&buf)?;
        self.fresh = [true; 3];
        Ok(self.measurement)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn field(&mut self, field: Field) -> Result<f32, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }
        if !self.fresh[field as usize] {
            self.read_measurement()?;
        }
        self.fresh[field as usize] = false;

        let m = &self.measurement;
        Ok(match field {
            Field::Co2 => m.co2_ppm,
            Field::Temperature => m.temperature_c,
            Field::Humidity => m.humidity_percent,
        })
    }

    fn send(&mut self, command: u16) -> Result<(), SensorError> {
        self.i2c
            .write(SCD30_ADDRESS, &command.to_be_bytes())
            .map_err(sensor_bus_error)
    }

    fn send_with_arg(&mut self, command: u16, arg: u16) -> Result<(), SensorError> {
        self.i2c
            .write(SCD30_ADDRESS, &command_with_arg(command, arg))
            .map_err(sensor_bus_error)
    }

    fn read_word(&mut self, command: u16) -> Result<u16, SensorError> {
        self.send(command)?;
        self.delay.delay_us(READ_DELAY_US);

        let mut buf = [0u8; 3];
        self.i2c
            .read(SCD30_ADDRESS, &mut buf)
            .map_err(sensor_bus_error)?;
        parse_word(&buf)
    }
}

impl<I2C: I2c, D: DelayNs> Co2Sensor for Scd30<I2C, D> {
    fn begin(&mut self) -> Result<(), SensorError> {
        // A valid firmware word proves the sensor is there and talking
        self.firmware_version()?;

        self.set_auto_self_calibration(self.config.auto_self_calibration)?;
        self.set_measurement_interval(self.config.measurement_interval_s)?;
        self.start_continuous(self.config.ambient_pressure_mbar)?;

        self.initialized = true;
        self.fresh = [false; 3];
        Ok(())
    }

    fn data_available(&mut self) -> Result<bool, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }
        Ok(self.read_word(cmd::GET_DATA_READY)? == 1)
    }

    fn co2_ppm(&mut self) -> Result<f32, SensorError> {
        self.field(Field::Co2)
    }

    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        self.field(Field::Temperature)
    }

    fn humidity_percent(&mut self) -> Result<f32, SensorError> {
        self.field(Field::Humidity)
    }

    fn set_forced_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        if !FRC_RANGE.contains(&reference_ppm) {
            return Err(SensorError::Rejected);
        }
        self.send_with_arg(cmd::FORCED_RECALIBRATION, reference_ppm)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use std::vec;
    use std::vec::Vec;

    /// Wire encoding of one float as the sensor sends it
    fn encode(value: f32) -> [u8; 6] {
        let b = value.to_be_bytes();
        [b[0], b[1], crc8(&b[0..2]), b[2], b[3], crc8(&b[2..4])]
    }

    fn measurement_bytes(co2: f32, t: f32, rh: f32) -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [co2, t, rh] {
            bytes.extend_from_slice(&encode(v));
        }
        bytes
    }

    fn word(value: u16) -> Vec<u8> {
        let [a, b] = value.to_be_bytes();
        vec![a, b, crc8(&[a, b])]
    }

    fn begin_transactions() -> Vec<Transaction> {
        vec![
            Transaction::write(SCD30_ADDRESS, vec![0xD1, 0x00]),
            Transaction::read(SCD30_ADDRESS, word(0x0342)),
            Transaction::write(SCD30_ADDRESS, command_with_arg(0x5306, 0).to_vec()),
            Transaction::write(SCD30_ADDRESS, command_with_arg(0x4600, 2).to_vec()),
            Transaction::write(SCD30_ADDRESS, vec![0x00, 0x10, 0x00, 0x00, 0x81]),
        ]
    }

    #[test]
    fn test_crc8_reference_values() {
        assert_eq!(crc8(&[0x00, 0x00]), 0x81);
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn test_command_with_arg() {
        assert_eq!(command_with_arg(0x5204, 400), [0x52, 0x04, 0x01, 0x90, crc8(&[0x01, 0x90])]);
    }

    #[test]
    fn test_parse_measurement() {
        let bytes = measurement_bytes(812.5, 23.25, 41.0);
        let mut raw = [0u8; 18];
        raw.copy_from_slice(&bytes);

        let m = parse_measurement(&raw).unwrap();
        assert_eq!(m.co2_ppm, 812.5);
        assert_eq!(m.temperature_c, 23.25);
        assert_eq!(m.humidity_percent, 41.0);
    }

    #[test]
    fn test_parse_measurement_crc_mismatch() {
        let mut raw = [0u8; 18];
        raw.copy_from_slice(&measurement_bytes(812.5, 23.25, 41.0));
        raw[11] ^= 0xFF;
        assert_eq!(parse_measurement(&raw), Err(SensorError::Crc));
    }

    #[test]
    fn test_begin_sequence() {
        let mut sensor = Scd30::new(I2cMock::new(&begin_transactions()), NoopDelay::new(), Scd30Config::default());
        assert_eq!(sensor.begin(), Ok(()));
        assert!(sensor.is_initialized());
        sensor.release().done();
    }

    #[test]
    fn test_begin_without_sensor() {
        let expectations = [Transaction::write(SCD30_ADDRESS, vec![0xD1, 0x00])
            .with_error(ErrorKind::NoAcknowledge(embedded_hal::i2c::NoAcknowledgeSource::Address))];
        let mut sensor = Scd30::new(I2cMock::new(&expectations), NoopDelay::new(), Scd30Config::default());
        assert_eq!(sensor.begin(), Err(SensorError::NotDetected));
        assert!(!sensor.is_initialized());
        sensor.release().done();
    }

    #[test]
    fn test_getters_share_one_measurement() {
        let mut expectations = begin_transactions();
        expectations.extend([
            Transaction::write(SCD30_ADDRESS, vec![0x02, 0x02]),
            Transaction::read(SCD30_ADDRESS, word(1)),
            Transaction::write(SCD30_ADDRESS, vec![0x03, 0x00]),
            Transaction::read(SCD30_ADDRESS, measurement_bytes(650.0, 21.5, 38.0)),
        ]);
        let mut sensor = Scd30::new(I2cMock::new(&expectations), NoopDelay::new(), Scd30Config::default());
        sensor.begin().unwrap();

        assert_eq!(sensor.data_available(), Ok(true));
        assert_eq!(sensor.co2_ppm(), Ok(650.0));
        assert_eq!(sensor.temperature_c(), Ok(21.5));
        assert_eq!(sensor.humidity_percent(), Ok(38.0));
        sensor.release().done();
    }

    #[test]
    fn test_reads_before_begin_rejected() {
        let mut sensor = Scd30::new(I2cMock::new(&[]), NoopDelay::new(), Scd30Config::default());
        assert_eq!(sensor.data_available(), Err(SensorError::NotInitialized));
        assert_eq!(sensor.co2_ppm(), Err(SensorError::NotInitialized));
        sensor.release().done();
    }

    #[test]
    fn test_forced_recalibration() {
        let expectations = [Transaction::write(
            SCD30_ADDRESS,
            command_with_arg(cmd::FORCED_RECALIBRATION, 400).to_vec(),
        )];
        let mut sensor = Scd30::new(I2cMock::new(&expectations), NoopDelay::new(), Scd30Config::default());
        assert_eq!(sensor.set_forced_recalibration(400), Ok(()));
        assert_eq!(sensor.set_forced_recalibration(399), Err(SensorError::Rejected));
        assert_eq!(sensor.set_forced_recalibration(2001), Err(SensorError::Rejected));
        sensor.release().done();
    }
}
