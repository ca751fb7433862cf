//! In-memory doubles for the hardware traits, shared by the unit tests

use core::cell::Cell;

use co2meter_hal::{FlashError, FlashStorage, StorageKey, UartTx};
use heapless::{String, Vec};

use crate::log::{LogSink, MAX_LINE_LEN};
use crate::traits::{
    Clock, Co2Sensor, DisplayBackend, DisplayError, FontSize, PressureSensor, SensorError,
};

/// Log sink remembering every line
#[derive(Default)]
pub struct RecordingSink {
    pub lines: Vec<String<MAX_LINE_LEN>, 128>,
}

impl RecordingSink {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn write_line(&mut self, line: &str) {
        let mut owned = String::new();
        let _ = owned.push_str(line);
        let _ = self.lines.push(owned);
    }
}

#[derive(Default)]
pub struct MockUart {
    pub bytes: Vec<u8, 256>,
}

impl UartTx for MockUart {
    type Error = ();

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
        self.bytes.extend_from_slice(data)
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

/// Scripted CO2 sensor
pub struct MockCo2 {
    pub begin_result: Result<(), SensorError>,
    pub ready: Result<bool, SensorError>,
    pub co2: Result<f32, SensorError>,
    pub temperature: Result<f32, SensorError>,
    pub humidity: Result<f32, SensorError>,
    pub frc_result: Result<(), SensorError>,
    pub frc_requests: Vec<u16, 4>,
}

impl Default for MockCo2 {
    fn default() -> Self {
        Self {
            begin_result: Ok(()),
            ready: Ok(true),
            co2: Ok(800.0),
            temperature: Ok(22.5),
            humidity: Ok(45.0),
            frc_result: Ok(()),
            frc_requests: Vec::new(),
        }
    }
}

impl Co2Sensor for MockCo2 {
    fn begin(&mut self) -> Result<(), SensorError> {
        self.begin_result
    }

    fn data_available(&mut self) -> Result<bool, SensorError> {
        self.ready
    }

    fn co2_ppm(&mut self) -> Result<f32, SensorError> {
        self.co2
    }

    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        self.temperature
    }

    fn humidity_percent(&mut self) -> Result<f32, SensorError> {
        self.humidity
    }

    fn set_forced_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        let _ = self.frc_requests.push(reference_ppm);
        self.frc_result
    }
}

/// Scripted pressure sensor
pub struct MockPressure {
    pub begin_result: Result<(), SensorError>,
    pub begun_at: Option<u8>,
    pub temperature: Result<f32, SensorError>,
    pub pressure_pa: Result<f32, SensorError>,
}

impl Default for MockPressure {
    fn default() -> Self {
        Self {
            begin_result: Ok(()),
            begun_at: None,
            temperature: Ok(23.0),
            pressure_pa: Ok(101_325.0),
        }
    }
}

impl PressureSensor for MockPressure {
    fn begin(&mut self, address: u8) -> Result<(), SensorError> {
        self.begun_at = Some(address);
        self.begin_result
    }

    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        self.temperature
    }

    fn pressure_pa(&mut self) -> Result<f32, SensorError> {
        self.pressure_pa
    }
}

pub type TextItem = (i32, i32, String<32>, FontSize);

/// Display recording what was drawn and what reached the panel
pub struct MockDisplay {
    pub init_result: Result<(), DisplayError>,
    pub flush_result: Result<(), DisplayError>,
    pub frame: Vec<TextItem, 16>,
    pub shown: Vec<TextItem, 16>,
    /// Every flushed frame, oldest first
    pub history: std::vec::Vec<Vec<TextItem, 16>>,
    pub flushes: u32,
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self {
            init_result: Ok(()),
            flush_result: Ok(()),
            frame: Vec::new(),
            shown: Vec::new(),
            history: std::vec::Vec::new(),
            flushes: 0,
        }
    }
}

impl MockDisplay {
    /// Text currently on the panel, if any item matches exactly
    pub fn shown_item(&self, text: &str) -> Option<&TextItem> {
        self.shown.iter().find(|item| item.2.as_str() == text)
    }

    pub fn shows(&self, text: &str) -> bool {
        self.shown_item(text).is_some()
    }

    /// Text of every flushed frame, oldest first
    pub fn frame_texts(&self) -> std::vec::Vec<std::vec::Vec<&str>> {
        self.history
            .iter()
            .map(|frame| frame.iter().map(|item| item.2.as_str()).collect())
            .collect()
    }
}

impl DisplayBackend for MockDisplay {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.init_result
    }

    fn clear(&mut self) {
        self.frame.clear();
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize) {
        let mut owned = String::new();
        let _ = owned.push_str(text);
        let _ = self.frame.push((x, y, owned, font));
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.flush_result?;
        self.shown = self.frame.clone();
        self.history.push(self.frame.clone());
        self.flushes += 1;
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (128, 64)
    }

    fn text_width(&self, text: &str, font: FontSize) -> u32 {
        let per_char = match font {
            FontSize::Small => 6,
            FontSize::Large => 12,
        };
        text.chars().count() as u32 * per_char
    }
}

/// Manually advanced clock
#[derive(Default)]
pub struct MockClock {
    pub now: Cell<u64>,
}

impl MockClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for &MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Delay that returns immediately and adds up what was requested
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Storage with the staged-write semantics of the flash driver
#[derive(Default)]
pub struct MockStorage {
    pub persisted: Vec<(StorageKey, u8), 4>,
    pub staged: Vec<(StorageKey, u8), 4>,
    pub fail_commit: bool,
    pub fail_read: bool,
    pub commits: u32,
}

impl MockStorage {
    pub fn with_flag(value: u8) -> Self {
        let mut storage = Self::default();
        let _ = storage.persisted.push((StorageKey::CalibrationFlag, value));
        storage
    }

    pub fn persisted_flag(&self) -> Option<u8> {
        lookup(&self.persisted, StorageKey::CalibrationFlag)
    }
}

fn lookup(entries: &[(StorageKey, u8)], key: StorageKey) -> Option<u8> {
    entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn upsert(entries: &mut Vec<(StorageKey, u8), 4>, key: StorageKey, value: u8) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => {
            let _ = entries.push((key, value));
        }
    }
}

impl FlashStorage for MockStorage {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        if self.fail_read {
            return Err(FlashError::Storage);
        }
        let value = lookup(&self.staged, key)
            .or_else(|| lookup(&self.persisted, key))
            .ok_or(FlashError::NotFound)?;
        let slot = buffer.first_mut().ok_or(FlashError::BufferTooSmall)?;
        *slot = value;
        Ok(1)
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let value = *data.first().ok_or(FlashError::Corrupted)?;
        upsert(&mut self.staged, key, value);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), FlashError> {
        if self.fail_commit {
            return Err(FlashError::Storage);
        }
        let staged = core::mem::take(&mut self.staged);
        for (key, value) in staged {
            upsert(&mut self.persisted, key, value);
        }
        self.commits += 1;
        Ok(())
    }
}
