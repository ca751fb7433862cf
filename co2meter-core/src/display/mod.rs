//! Display rendering and warning blink timing

pub mod blink;
pub mod manager;

pub use blink::BlinkState;
pub use manager::{format_value, DisplayManager, Frame};

use crate::log::Log;
use crate::log_warn;
use crate::traits::DisplayError;

/// Log a failed screen update; the loop carries on with a stale screen
pub fn report<T, L: Log>(log: &mut L, result: Result<T, DisplayError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log_warn!(log, "Display update failed: {:?}", e);
            None
        }
    }
}
