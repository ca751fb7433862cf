//! Monotonic clock backed by the embassy time driver

use co2meter_core::traits::Clock;
use embassy_time::Instant;

/// Milliseconds since boot, as seen by the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
