//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod clock;
pub mod display;
pub mod sensor;

pub use clock::Clock;
pub use display::{DisplayBackend, DisplayError, FontSize};
pub use sensor::{Co2Sensor, PressureSensor, SensorError};
