//! Warning blink timing
//!
//! The warning screen alternates with the normal screen. The visible
//! state flips whenever at least one interval has passed since the last
//! flip, so a full on/off cycle takes two intervals. Timing only advances
//! when [`BlinkState::update`] is called, i.e. once per loop tick.

/// Visibility of the warning screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkState {
    active: bool,
    last_toggle_ms: u64,
}

impl BlinkState {
    pub const fn new() -> Self {
        Self {
            active: false,
            last_toggle_ms: 0,
        }
    }

    /// Flip the state if `interval_ms` has elapsed since the last flip
    ///
    /// Returns true when a flip happened.
    pub fn update(&mut self, now_ms: u64, interval_ms: u32) -> bool {
        if now_ms.saturating_sub(self.last_toggle_ms) >= u64::from(interval_ms) {
            self.active = !self.active;
            self.last_toggle_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Whether the warning screen is the visible one
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_toggle_ms(&self) -> u64 {
        self.last_toggle_ms
    }

    /// Back to the normal screen; the next warning shows immediately
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
