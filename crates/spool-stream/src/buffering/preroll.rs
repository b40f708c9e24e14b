//! Waiting for cached audio: readiness checks and configure-time prefill.

use super::cache::RangeState;
use super::shared_state::SharedStreamState;
use crate::butler::{ClientId, Scheduler};
use parking_lot::{Condvar, Mutex};
use spool_core::clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Poll interval of the configure-time prefill loop.
const PREFILL_POLL: Duration = Duration::from_millis(5);

/// Generation counter bumped after every committed refill.
///
/// Waiters read the generation before checking coverage and then wait for
/// it to move, so a refill landing between the check and the wait is not
/// missed.
#[derive(Debug, Default)]
pub(crate) struct ReadySignal {
    generation: Mutex<u64>,
    cond: Condvar,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    pub fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Block until the generation differs from `seen` or `timeout` passes.
    ///
    /// Returns whether the generation moved.
    pub fn wait_past(&self, seen: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut generation = self.generation.lock();
        while *generation == seen {
            if self.cond.wait_until(&mut generation, deadline).timed_out() {
                return *generation != seen;
            }
        }
        true
    }
}

/// The next block has no playable samples, so there is nothing to wait for.
pub(crate) fn nothing_to_wait_for(cursor: i64, n: usize, looping: bool, total_length: i64) -> bool {
    cursor.saturating_add(n as i64) <= 0 || (!looping && total_length > 0 && cursor >= total_length)
}

/// Every playable sample of the next `n` is cached.
///
/// Samples before position 0 and, for a non-looping source of known length,
/// past its end are silent by definition and need no coverage.
pub(crate) fn block_covered(range: &RangeState, n: usize, looping: bool, total_length: i64) -> bool {
    let start = range.next_read_pos.max(0);
    let mut end = range.next_read_pos.saturating_add(n as i64);
    if !looping && total_length > 0 {
        end = end.min(total_length);
    }
    if end <= start {
        return true;
    }
    !range.is_empty() && range.valid_start <= start && range.valid_end >= end
}

/// Wait until the next `n` samples are cached, up to `timeout_ms`.
pub(crate) fn wait_until_ready(shared: &SharedStreamState, n: usize, timeout_ms: u32) -> bool {
    let looping = shared.is_looping();
    let total_length = shared.total_length();

    let cursor = shared.range.lock().next_read_pos;
    if nothing_to_wait_for(cursor, n, looping, total_length) {
        return true;
    }

    let started = clock::millisecond_counter();
    loop {
        let seen = shared.ready.generation();
        if block_covered(&shared.range.lock(), n, looping, total_length) {
            return true;
        }

        let elapsed = clock::elapsed_ms(started, clock::millisecond_counter());
        let Some(left) = clock::remaining_ms(timeout_ms, elapsed) else {
            return false;
        };
        shared.ready.wait_past(seen, Duration::from_millis(u64::from(left)));
    }
}

/// The source cannot supply more look-ahead than is already cached.
fn source_exhausted(range: &RangeState, looping: bool, total_length: i64) -> bool {
    !looping
        && total_length > 0
        && (range.valid_end >= total_length || range.next_read_pos >= total_length)
}

/// Keep the refill client at the front of the queue until `target` samples
/// are cached.
///
/// Stops early when the source is exhausted, when `epoch` moves away from
/// `expected_epoch` (a newer configure or a release), or after `timeout_ms`.
/// Returns whether the target was reached.
pub(crate) fn prefill(
    shared: &SharedStreamState,
    scheduler: &dyn Scheduler,
    id: ClientId,
    target: usize,
    epoch: &AtomicU64,
    expected_epoch: u64,
    timeout_ms: u32,
) -> bool {
    let started = clock::millisecond_counter();
    loop {
        if epoch.load(Ordering::Acquire) != expected_epoch {
            tracing::debug!("Prefill abandoned by reconfiguration");
            return false;
        }

        {
            let range = shared.range.lock();
            if range.len() >= target as i64 {
                return true;
            }
            if source_exhausted(&range, shared.is_looping(), shared.total_length()) {
                return true;
            }
        }

        let elapsed = clock::elapsed_ms(started, clock::millisecond_counter());
        if clock::remaining_ms(timeout_ms, elapsed).is_none() {
            tracing::warn!("Prefill timed out after {}ms ({} samples wanted)", timeout_ms, target);
            return false;
        }

        scheduler.prioritize(id);
        std::thread::sleep(PREFILL_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn range(valid_start: i64, valid_end: i64, next_read_pos: i64) -> RangeState {
        RangeState {
            valid_start,
            valid_end,
            next_read_pos,
            was_looping: false,
        }
    }

    #[test]
    fn test_nothing_to_wait_for() {
        assert!(nothing_to_wait_for(-600, 512, false, 10_000));
        assert!(nothing_to_wait_for(10_000, 512, false, 10_000));
        assert!(!nothing_to_wait_for(10_000, 512, true, 10_000));
        assert!(!nothing_to_wait_for(10_000, 512, false, 0));
        assert!(!nothing_to_wait_for(-100, 512, false, 10_000));
    }

    #[test]
    fn test_block_covered() {
        assert!(block_covered(&range(0, 4092, 0), 512, false, 10_000));
        assert!(!block_covered(&range(0, 300, 0), 512, false, 10_000));
        assert!(!block_covered(&range(0, 0, 0), 512, false, 10_000));
        // Only the playable part before the end needs coverage
        assert!(block_covered(&range(9800, 10_000, 9800), 512, false, 10_000));
        assert!(!block_covered(&range(9800, 10_000, 9800), 512, true, 10_000));
        // Negative part is silent
        assert!(block_covered(&range(0, 512, -100), 512, false, 10_000));
    }

    #[test]
    fn test_source_exhausted() {
        assert!(source_exhausted(&range(9000, 10_000, 9000), false, 10_000));
        assert!(!source_exhausted(&range(9000, 10_000, 9000), true, 10_000));
        assert!(!source_exhausted(&range(0, 2048, 0), false, 10_000));
        assert!(!source_exhausted(&range(0, 2048, 0), false, 0));
    }

    #[test]
    fn test_wait_past_times_out() {
        let signal = ReadySignal::new();
        let seen = signal.generation();
        assert!(!signal.wait_past(seen, Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_past_sees_earlier_notify() {
        let signal = ReadySignal::new();
        let seen = signal.generation();
        signal.notify();
        assert!(signal.wait_past(seen, Duration::from_millis(0)));
    }

    #[test]
    fn test_wait_past_wakes_on_notify() {
        let signal = Arc::new(ReadySignal::new());
        let seen = signal.generation();

        let notifier = Arc::clone(&signal);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            notifier.notify();
        });

        assert!(signal.wait_past(seen, Duration::from_secs(5)));
        handle.join().unwrap();
    }
}
