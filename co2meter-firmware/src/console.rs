//! Log console
//!
//! Every log line goes to the serial console and is mirrored to the
//! defmt RTT channel when a probe is attached.

use co2meter_core::log::{LogSink, UartSink};
use co2meter_hal::UartTx;

pub struct Console<U: UartTx> {
    serial: UartSink<U>,
}

impl<U: UartTx> Console<U> {
    pub fn new(uart: U) -> Self {
        Self {
            serial: UartSink::new(uart),
        }
    }
}

impl<U: UartTx> LogSink for Console<U> {
    fn write_line(&mut self, line: &str) {
        defmt::println!("{=str}", line);
        self.serial.write_line(line);
    }
}
