//! Wrap-safe millisecond clock for bounded waits.
//!
//! The counter is a `u32` of milliseconds since the first call in this
//! process. It rolls over after ~49.7 days; differences are taken with
//! wrapping subtraction so elapsed times stay correct across the rollover.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Current value of the process-wide millisecond counter.
pub fn millisecond_counter() -> u32 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u32
}

/// Milliseconds from `start` to `now`, treating the counter as a ring.
#[inline]
pub fn elapsed_ms(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}

/// Milliseconds left of `timeout_ms` after `elapsed`, or `None` when spent.
#[inline]
pub fn remaining_ms(timeout_ms: u32, elapsed: u32) -> Option<u32> {
    timeout_ms.checked_sub(elapsed).filter(|&left| left > 0)
}
