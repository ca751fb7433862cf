//! co2meter Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the monitor logic
//! is written against. Chip-specific HALs implement them so the same
//! application code runs on the target and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (co2meter-firmware)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  co2meter-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ co2meter-hal- │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`] - Serial console output
//! - [`i2c::I2cBus`] - I2C address probing
//! - [`flash::FlashStorage`] - Persistent storage with staged commits

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod i2c;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use i2c::{I2cBus, I2cConfig, ProbeResult};
pub use uart::{UartConfig, UartTx, CONSOLE_BAUDRATE};
