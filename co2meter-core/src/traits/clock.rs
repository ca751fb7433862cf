//! Monotonic time source

/// Millisecond clock used for blink timing
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin. Must never go backwards.
    fn now_ms(&self) -> u64;
}
