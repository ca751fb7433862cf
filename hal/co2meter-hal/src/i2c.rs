//! I2C bus abstractions
//!
//! Device drivers talk to the bus through `embedded-hal` directly. This
//! module only covers what the diagnostics need on top of that: probing
//! an address to see whether anything answers.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};

/// Outcome of probing a single 7-bit address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeResult {
    /// A device acknowledged its address
    Ack,
    /// Nobody answered
    Nack,
    /// The bus reported some other failure
    Error,
}

/// I2C bus master capable of address probing
pub trait I2cBus {
    /// Read one byte from `address` and report how the bus responded
    fn probe(&mut self, address: u8) -> ProbeResult;
}

// A one-byte read rather than a zero-length write: the RP2040 controller
// refuses empty transfers.
impl<T: I2c> I2cBus for T {
    fn probe(&mut self, address: u8) -> ProbeResult {
        let mut byte = [0u8; 1];
        match self.read(address, &mut byte) {
            Ok(()) => ProbeResult::Ack,
            Err(e) => classify(e.kind()),
        }
    }
}

fn classify(kind: ErrorKind) -> ProbeResult {
    match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        | ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown) => ProbeResult::Nack,
        _ => ProbeResult::Error,
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy)]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz). The SCD30 tops out here.
    pub const STANDARD: Self = Self { frequency: 100_000 };
}
