//! I2C bus scan
//!
//! Probes every non-reserved 7-bit address and logs who answered. Used
//! during bring-up to check wiring and the BMP280 address strapping.

use co2meter_hal::{I2cBus, ProbeResult};
use heapless::Vec;

use crate::log::Log;
use crate::{log_info, log_warn};

/// First address probed; 0x00..=0x07 are reserved
pub const FIRST_ADDRESS: u8 = 0x08;
/// Last address probed; 0x78..=0x7F are reserved
pub const LAST_ADDRESS: u8 = 0x77;

/// Addresses that answered, plus the count of bus errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub found: Vec<u8, 16>,
    pub errors: u8,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn contains(&self, address: u8) -> bool {
        self.found.contains(&address)
    }
}

/// Probe addresses 0x08..=0x77 in ascending order
pub fn scan<B: I2cBus, L: Log>(bus: &mut B, log: &mut L) -> ScanReport {
    let mut report = ScanReport::default();

    log_info!(log, "Scanning I2C bus...");
    for address in FIRST_ADDRESS..=LAST_ADDRESS {
        match bus.probe(address) {
            ProbeResult::Ack => {
                match device_name(address) {
                    Some(name) => {
                        log_info!(log, "I2C device found at address 0x{:02X} ({})", address, name)
                    }
                    None => log_info!(log, "I2C device found at address 0x{:02X}", address),
                }
                let _ = report.found.push(address);
            }
            ProbeResult::Error => {
                log_warn!(log, "Unknown error at address 0x{:02X}", address);
                report.errors = report.errors.saturating_add(1);
            }
            ProbeResult::Nack => {}
        }
    }

    if report.is_empty() {
        log_info!(log, "No I2C devices found.");
    } else {
        log_info!(log, "I2C scan complete.");
    }
    report
}

/// Known parts on this board, by address
pub fn device_name(address: u8) -> Option<&'static str> {
    match address {
        0x61 => Some("SCD30"),
        0x76 | 0x77 => Some("BMP280"),
        0x3C | 0x3D => Some("SSD1306"),
        _ => None,
    }
}
