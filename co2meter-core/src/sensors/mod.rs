//! Sensor readings, plausibility filtering and the sensor manager

pub mod manager;
pub mod reading;
pub mod validation;

pub use manager::{CalibrationCheck, SensorManager};
pub use reading::Reading;
pub use validation::{FallbackCache, Filtered, Quantity};
