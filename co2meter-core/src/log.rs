//! Leveled console logger
//!
//! The logger is an explicit context handed to every component that
//! reports progress; there is no global logger state. Each emitted
//! message becomes exactly one line of the form `[LEVEL] message`.

use core::fmt::{self, Write};

use heapless::String;

use co2meter_hal::UartTx;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest line the logger emits; longer messages are truncated
pub const MAX_LINE_LEN: usize = 96;

/// Log verbosity
///
/// Ordered from quietest to most verbose. A message is emitted when its
/// level is not `None` and is less than or equal to the logger threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum LogLevel {
    /// Logging disabled
    None = 0,
    Error = 1,
    Warning = 2,
    #[default]
    Info = 3,
    Debug = 4,
}

impl LogLevel {
    /// Prefix text used in the emitted line
    pub const fn label(self) -> &'static str {
        match self {
            LogLevel::None => "NONE",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Create a level from its ordinal
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LogLevel::None),
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Warning),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

/// Destination for finished log lines
pub trait LogSink {
    /// Write one line. `line` carries no terminator.
    fn write_line(&mut self, line: &str);
}

/// Anything that accepts leveled log messages
pub trait Log {
    /// Emit `args` at `level` if the threshold allows it
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>);

    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args)
    }

    fn warning(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warning, args)
    }

    fn info(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args)
    }

    fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args)
    }
}

/// Leveled logger writing to a [`LogSink`]
pub struct Logger<S> {
    sink: S,
    level: LogLevel,
}

impl<S: LogSink> Logger<S> {
    /// Create a logger with the given threshold
    pub fn new(sink: S, level: LogLevel) -> Self {
        Self { sink, level }
    }

    /// Change the threshold
    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    /// Current threshold
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether a message at `level` would be emitted
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level <= self.level
    }

    /// Borrow the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: LogSink> Log for Logger<S> {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }

        let mut line = LineBuffer(String::new());
        // LineBuffer never reports an error; overflow is truncated
        let _ = write!(line, "[{}] {}", level.label(), args);
        self.sink.write_line(line.0.as_str());
    }
}

/// Fixed-capacity line that silently drops whatever does not fit
struct LineBuffer(String<MAX_LINE_LEN>);

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Log sink writing CRLF-terminated lines to a UART
pub struct UartSink<U> {
    uart: U,
}

impl<U: UartTx> UartSink<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }
}

impl<U: UartTx> LogSink for UartSink<U> {
    fn write_line(&mut self, line: &str) {
        // The console is the error channel; a failed write has nowhere to go.
        let _ = self.uart.write_blocking(line.as_bytes());
        let _ = self.uart.write_blocking(b"\r\n");
        let _ = self.uart.flush();
    }
}

/// Log at error level with `format_args!` syntax
#[macro_export]
macro_rules! log_error {
    ($log:expr, $($arg:tt)*) => {
        $crate::log::Log::log($log, $crate::log::LogLevel::Error, format_args!($($arg)*))
    };
}

/// Log at warning level with `format_args!` syntax
#[macro_export]
macro_rules! log_warn {
    ($log:expr, $($arg:tt)*) => {
        $crate::log::Log::log($log, $crate::log::LogLevel::Warning, format_args!($($arg)*))
    };
}

/// Log at info level with `format_args!` syntax
#[macro_export]
macro_rules! log_info {
    ($log:expr, $($arg:tt)*) => {
        $crate::log::Log::log($log, $crate::log::LogLevel::Info, format_args!($($arg)*))
    };
}

/// Log at debug level with `format_args!` syntax
#[macro_export]
macro_rules! log_debug {
    ($log:expr, $($arg:tt)*) => {
        $crate::log::Log::log($log, $crate::log::LogLevel::Debug, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    #[test]
    fn test_line_format() {
        let mut logger = Logger::new(RecordingSink::default(), LogLevel::Debug);
        log_info!(&mut logger, "CO2: {:.2} ppm", 412.5f32);
        log_error!(&mut logger, "Display initialization failed");

        assert_eq!(logger.sink().lines[0].as_str(), "[INFO] CO2: 412.50 ppm");
        assert_eq!(
            logger.sink().lines[1].as_str(),
            "[ERROR] Display initialization failed"
        );
    }

    #[test]
    fn test_threshold_filters_verbose_levels() {
        let mut logger = Logger::new(RecordingSink::default(), LogLevel::Warning);
        logger.error(format_args!("e"));
        logger.warning(format_args!("w"));
        logger.info(format_args!("i"));
        logger.debug(format_args!("d"));

        assert_eq!(logger.sink().lines.len(), 2);
        assert_eq!(logger.sink().lines[0].as_str(), "[ERROR] e");
        assert_eq!(logger.sink().lines[1].as_str(), "[WARNING] w");
    }

    #[test]
    fn test_none_threshold_is_silent() {
        let mut logger = Logger::new(RecordingSink::default(), LogLevel::None);
        logger.error(format_args!("nothing"));
        assert!(logger.sink().lines.is_empty());
    }

    #[test]
    fn test_none_level_message_never_emitted() {
        let mut logger = Logger::new(RecordingSink::default(), LogLevel::Debug);
        logger.log(LogLevel::None, format_args!("hidden"));
        assert!(logger.sink().lines.is_empty());
    }

    #[test]
    fn test_set_level() {
        let mut logger = Logger::new(RecordingSink::default(), LogLevel::Error);
        assert!(!logger.enabled(LogLevel::Info));
        logger.set_level(LogLevel::Info);
        assert_eq!(logger.level(), LogLevel::Info);
        assert!(logger.enabled(LogLevel::Info));
        assert!(!logger.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_long_message_truncated() {
        let mut logger = Logger::new(RecordingSink::default(), LogLevel::Info);
        let long = [b'x'; 200];
        let long = core::str::from_utf8(&long).unwrap();
        logger.info(format_args!("{}", long));

        let line = &logger.sink().lines[0];
        assert_eq!(line.len(), MAX_LINE_LEN);
        assert!(line.starts_with("[INFO] xxx"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::None < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::from_u8(4), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_u8(5), None);
    }

    #[test]
    fn test_uart_sink_terminates_lines() {
        let mut logger = Logger::new(
            UartSink::new(crate::testing::MockUart::default()),
            LogLevel::Info,
        );
        logger.info(format_args!("I2C scan complete."));
        assert_eq!(
            logger.sink().uart.bytes.as_slice(),
            b"[INFO] I2C scan complete.\r\n"
        );
    }
}
