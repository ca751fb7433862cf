//! Environmental sensors

pub mod bmp280;
pub mod scd30;

pub use bmp280::{Bmp280, Calibration as Bmp280Calibration, BMP280_CHIP_ID};
pub use scd30::{Measurement, Scd30, Scd30Config, SCD30_ADDRESS};
