//! Bosch BMP280 barometric pressure sensor (I2C mode)
//!
//! The address is 0x76 or 0x77 depending on how SDO is strapped, so it is
//! supplied at `begin` time. Compensation uses the floating-point formulas
//! from the datasheet (section 8.1) with the factory trimming words read
//! from the calibration block.

use co2meter_core::traits::{PressureSensor, SensorError};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::sensor_bus_error;

/// Value of the chip id register on a genuine BMP280
pub const BMP280_CHIP_ID: u8 = 0x58;

/// BMP280 registers
pub mod reg {
    /// Start of the 24-byte trimming block (0x88..=0x9F)
    pub const CALIB: u8 = 0x88;
    pub const CHIP_ID: u8 = 0xD0;
    /// Write 0xB6 for a power-on reset
    pub const RESET: u8 = 0xE0;
    pub const STATUS: u8 = 0xF3;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const CONFIG: u8 = 0xF5;
    /// Pressure MSB; pressure and temperature follow as one 6-byte burst
    pub const DATA: u8 = 0xF7;
}

const RESET_VALUE: u8 = 0xB6;

/// Temperature x16, pressure x16, normal mode
const CTRL_MEAS_VALUE: u8 = (0b101 << 5) | (0b101 << 2) | 0b11;

/// 0.5 ms standby, IIR filter off
const CONFIG_VALUE: u8 = 0x00;

/// Raw value reported for a skipped conversion
const SKIPPED: i32 = 0x80000;

/// Wait after reset before the trimming block is valid
const STARTUP_MS: u32 = 10;

/// Factory trimming parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
}

impl Calibration {
    /// Decode the little-endian trimming block
    pub fn parse(raw: &[u8; 24]) -> Self {
        let u = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);

        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
        }
    }

    /// Temperature in °C plus the `t_fine` carry used by the pressure formula
    pub fn compensate_temperature(&self, adc_t: i32) -> (f32, f64) {
        let adc = adc_t as f64;
        let t1 = self.t1 as f64;

        let var1 = (adc / 16384.0 - t1 / 1024.0) * self.t2 as f64;
        let d = adc / 131072.0 - t1 / 8192.0;
        let var2 = d * d * self.t3 as f64;

        let t_fine = var1 + var2;
        ((t_fine / 5120.0) as f32, t_fine)
    }

    /// Pressure in Pa
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: f64) -> f32 {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.p6 as f64 / 32768.0;
        var2 += var1 * self.p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.p4 as f64 * 65536.0;
        var1 = (self.p3 as f64 * var1 * var1 / 524288.0 + self.p2 as f64 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.p1 as f64;
        if var1 == 0.0 {
            // Avoid division by zero on a blank trimming block
            return 0.0;
        }

        let mut p = 1048576.0 - adc_p as f64;
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        var1 = self.p9 as f64 * p * p / 2147483648.0;
        var2 = p * self.p8 as f64 / 32768.0;
        (p + (var1 + var2 + self.p7 as f64) / 16.0) as f32
    }
}

/// Assemble a 20-bit conversion result from msb, lsb, xlsb
fn raw20(bytes: &[u8]) -> i32 {
    ((bytes[0] as i32) << 12) | ((bytes[1] as i32) << 4) | ((bytes[2] as i32) >> 4)
}

/// BMP280 driver
pub struct Bmp280<I2C, D> {
    i2c: I2C,
    delay: D,
    address: Option<u8>,
    calibration: Calibration,
}

impl<I2C: I2c, D: DelayNs> Bmp280<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: None,
            calibration: Calibration::default(),
        }
    }

    /// Address given to a successful `begin`
    pub fn address(&self) -> Option<u8> {
        self.address
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Raw (adc_p, adc_t) from one burst read
    fn read_raw(&mut self) -> Result<(i32, i32), SensorError> {
        let address = self.address.ok_or(SensorError::NotInitialized)?;
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(address, &[reg::DATA], &mut buf)
            .map_err(sensor_bus_error)?;
        Ok((raw20(&buf[0..3]), raw20(&buf[3..6])))
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(address, &[register, value])
            .map_err(sensor_bus_error)
    }
}

impl<I2C: I2c, D: DelayNs> PressureSensor for Bmp280<I2C, D> {
    fn begin(&mut self, address: u8) -> Result<(), SensorError> {
        self.address = None;

        let mut id = [0u8; 1];
        self.i2c
            .write_read(address, &[reg::CHIP_ID], &mut id)
            .map_err(sensor_bus_error)?;
        if id[0] != BMP280_CHIP_ID {
            return Err(SensorError::NotDetected);
        }

        self.write_register(address, reg::RESET, RESET_VALUE)?;
        self.delay.delay_ms(STARTUP_MS);

        let mut raw = [0u8; 24];
        self.i2c
            .write_read(address, &[reg::CALIB], &mut raw)
            .map_err(sensor_bus_error)?;
        self.calibration = Calibration::parse(&raw);

        self.write_register(address, reg::CONFIG, CONFIG_VALUE)?;
        self.write_register(address, reg::CTRL_MEAS, CTRL_MEAS_VALUE)?;

        self.address = Some(address);
        Ok(())
    }

    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        let (_, adc_t) = self.read_raw()?;
        if adc_t == SKIPPED {
            return Ok(f32::NAN);
        }
        Ok(self.calibration.compensate_temperature(adc_t).0)
    }

    fn pressure_pa(&mut self) -> Result<f32, SensorError> {
        let (adc_p, adc_t) = self.read_raw()?;
        if adc_t == SKIPPED || adc_p == SKIPPED {
            return Ok(f32::NAN);
        }
        let (_, t_fine) = self.calibration.compensate_temperature(adc_t);
        Ok(self.calibration.compensate_pressure(adc_p, t_fine))
    }
}
