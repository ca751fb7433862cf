//! Console UART adapter
//!
//! Wraps any blocking `embedded_io::Write` transmitter (the RP2040 UART TX
//! half in practice) so it can back the log console.

use co2meter_hal::UartTx;

/// Console output over a blocking serial writer
pub struct ConsoleUart<W> {
    tx: W,
}

impl<W> ConsoleUart<W> {
    /// Wrap a transmitter
    pub fn new(tx: W) -> Self {
        Self { tx }
    }

    /// Give the transmitter back
    pub fn release(self) -> W {
        self.tx
    }
}

impl<W: embedded_io::Write> UartTx for ConsoleUart<W> {
    type Error = W::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.flush()
    }
}
