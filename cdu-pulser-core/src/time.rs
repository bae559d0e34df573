//! Wrap-safe millisecond arithmetic
//!
//! The monotonic clock is a `u32` that wraps roughly every 49.7 days.
//! Deadlines are compared through the signed difference of two timestamps,
//! which stays correct across the wrap as long as the interval being
//! measured is shorter than [`MAX_INTERVAL_MS`].

/// Monotonic timestamp in milliseconds
pub type Millis = u32;

/// Longest interval that signed-difference comparison can represent
pub const MAX_INTERVAL_MS: u32 = i32::MAX as u32;

/// Timestamp `duration_ms` after `now`, wrapping at `u32::MAX`
#[inline]
pub const fn deadline_after(now: Millis, duration_ms: u32) -> Millis {
    now.wrapping_add(duration_ms)
}

/// Check whether `deadline` has been reached at `now`
#[inline]
pub const fn deadline_reached(now: Millis, deadline: Millis) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Milliseconds elapsed from `since` to `now`
#[inline]
pub const fn elapsed(since: Millis, now: Millis) -> u32 {
    now.wrapping_sub(since)
}

/// Milliseconds left until `deadline`, zero once it has passed
#[inline]
pub const fn remaining(now: Millis, deadline: Millis) -> u32 {
    if deadline_reached(now, deadline) {
        0
    } else {
        deadline.wrapping_sub(now)
    }
}
