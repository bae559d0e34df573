//! Monotonic time source

use crate::time::Millis;

/// Free-running millisecond counter
///
/// The counter wraps at `u32::MAX`; consumers compare timestamps with the
/// helpers in [`crate::time`].
pub trait MonotonicClock {
    /// Current time in milliseconds
    fn now_ms(&self) -> Millis;
}
