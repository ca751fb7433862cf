//! RP2040-specific HAL for the CO2 monitor firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `co2meter-hal` traits and of the clock trait from `co2meter-core`:
//!
//! - Flash storage driver with staged writes (implements `co2meter_hal::FlashStorage`)
//! - Console UART adapter (implements `co2meter_hal::UartTx`)
//! - Monotonic millisecond clock backed by embassy-time

#![no_std]

pub mod clock;
pub mod flash;
pub mod uart;
