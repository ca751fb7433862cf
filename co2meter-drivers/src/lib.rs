//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in co2meter-core for the parts on the monitor board:
//!
//! - Sensirion SCD30 NDIR CO2 / temperature / humidity sensor
//! - Bosch BMP280 pressure / temperature sensor
//! - SSD1306 128x64 monochrome OLED
//!
//! All drivers use blocking `embedded-hal` I2C so they can share one bus
//! through `embedded-hal-bus` devices.

#![no_std]
#![deny(unsafe_code)]

pub mod display;
pub mod sensor;

use co2meter_core::traits::SensorError;
use embedded_hal::i2c::{Error, ErrorKind};

/// Map a bus error to the sensor error taxonomy. A missing ack means
/// nothing is listening at that address.
pub(crate) fn sensor_bus_error<E: Error>(e: E) -> SensorError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => SensorError::NotDetected,
        _ => SensorError::Bus,
    }
}
