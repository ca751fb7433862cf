//! Flash storage driver for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage in the last
//! 16KB of flash. Writes are held in RAM until `commit`, which gives the
//! persisted calibration byte the same write-then-commit behaviour as an
//! emulated EEPROM.
//!
//! Implements the `FlashStorage` trait from `co2meter-hal`.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use heapless::Vec;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use co2meter_hal::flash::{FlashError, StorageKey};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const STORAGE_PARTITION_SIZE: usize = 4 * ERASE_SIZE; // 16KB, keep in sync with memory.x
pub const STORAGE_PARTITION_START: usize = FLASH_SIZE - STORAGE_PARTITION_SIZE;

/// Flash range for the storage partition
pub const STORAGE_RANGE: core::ops::Range<u32> =
    (STORAGE_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Largest value accepted for a single key
pub const MAX_VALUE_LEN: usize = 32;

/// Number of distinct keys that can be staged between commits
const MAX_STAGED: usize = 4;

/// Scratch buffer size for sequential-storage item headers plus data
const DATA_BUFFER_LEN: usize = 128;

type StagedValue = Vec<u8, MAX_VALUE_LEN>;

/// RP2040 Flash storage implementation
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    staged: Vec<(StorageKey, StagedValue), MAX_STAGED>,
}

impl<'d> Rp2040FlashStorage<'d> {
    /// Create a new flash storage instance
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            staged: Vec::new(),
        }
    }

    fn staged_value(&self, key: StorageKey) -> Option<&StagedValue> {
        self.staged
            .iter()
            .find(|(staged_key, _)| *staged_key == key)
            .map(|(_, value)| value)
    }
}

impl<'d> co2meter_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        if let Some(value) = self.staged_value(key) {
            let len = value.len();
            if buffer.len() < len {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..len].copy_from_slice(value);
            return Ok(len);
        }

        let mut data_buffer = [0u8; DATA_BUFFER_LEN];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STORAGE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(FlashError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(_) => Err(FlashError::Storage),
        }
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let value = StagedValue::from_slice(data).map_err(|_| FlashError::BufferTooSmall)?;

        if let Some(slot) = self.staged.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return Ok(());
        }

        self.staged.push((key, value)).map_err(|_| FlashError::Full)
    }

    async fn commit(&mut self) -> Result<(), FlashError> {
        let mut data_buffer = [0u8; DATA_BUFFER_LEN];

        // Entries stay staged until they are stored, so a failed commit can be retried.
        while let Some((key, value)) = self.staged.first() {
            map::store_item(
                &mut self.flash,
                STORAGE_RANGE,
                &mut NoCache::new(),
                &mut data_buffer,
                key,
                &value.as_slice(),
            )
            .await
            .map_err(|_| FlashError::Storage)?;

            self.staged.remove(0);
        }

        Ok(())
    }
}
