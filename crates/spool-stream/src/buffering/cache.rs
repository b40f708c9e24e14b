//! Wraparound sample storage and the valid-range bookkeeping around it.

use atomic_float::AtomicF32;
use spool_core::wrap;
use std::sync::atomic::Ordering;

/// Fixed-capacity per-channel sample storage addressed by absolute position.
///
/// Samples are relaxed atomics so the refill thread can write slots outside
/// the published valid range while the audio thread reads slots inside it.
/// Visibility of a committed write is carried by the range lock.
#[derive(Debug)]
pub(crate) struct CacheStorage {
    channels: Vec<Box<[AtomicF32]>>,
    capacity: usize,
}

impl CacheStorage {
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            channels: (0..channels)
                .map(|_| (0..capacity).map(|_| AtomicF32::new(0.0)).collect())
                .collect(),
            capacity,
        }
    }

    /// Storage of an unconfigured stream.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Store `samples` for `channel` starting at absolute `start`.
    pub fn write(&self, channel: usize, start: i64, samples: &[f32]) {
        let Some(slots) = self.channels.get(channel) else {
            return;
        };
        for (relative, segment) in wrap::split(start, samples.len(), self.capacity).segments() {
            let src = &samples[relative..relative + segment.len];
            for (slot, &sample) in slots[segment.offset..segment.end()].iter().zip(src) {
                slot.store(sample, Ordering::Relaxed);
            }
        }
    }

    /// Load samples for `channel` starting at absolute `start` into `out`.
    pub fn read(&self, channel: usize, start: i64, out: &mut [f32]) {
        let Some(slots) = self.channels.get(channel) else {
            out.fill(0.0);
            return;
        };
        for (relative, segment) in wrap::split(start, out.len(), self.capacity).segments() {
            let dst = &mut out[relative..relative + segment.len];
            for (sample, slot) in dst.iter_mut().zip(&slots[segment.offset..segment.end()]) {
                *sample = slot.load(Ordering::Relaxed);
            }
        }
    }
}

/// Cursor and valid-range bookkeeping, guarded by the range lock.
///
/// `[valid_start, valid_end)` holds absolute positions whose samples are in
/// storage. It is empty when `valid_start == valid_end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RangeState {
    pub valid_start: i64,
    pub valid_end: i64,
    /// Absolute position of the next sample the audio thread will read.
    pub next_read_pos: i64,
    /// Source looping flag the cached content was produced under.
    pub was_looping: bool,
}

impl RangeState {
    #[inline]
    pub fn len(&self) -> i64 {
        self.valid_end - self.valid_start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.valid_end <= self.valid_start
    }

    #[inline]
    pub fn contains(&self, position: i64) -> bool {
        position >= self.valid_start && position < self.valid_end
    }

    /// Drop all cached content.
    pub fn invalidate(&mut self) {
        self.valid_start = 0;
        self.valid_end = 0;
    }

    /// Block-relative `[from, to)` of the next `n` samples that are cached.
    ///
    /// Returns `(0, 0)` when nothing in the block is cached.
    pub fn block_intersection(&self, n: usize) -> (usize, usize) {
        let cursor = self.next_read_pos;
        let lo = cursor.max(self.valid_start);
        let hi = cursor.saturating_add(n as i64).min(self.valid_end);
        if hi <= lo {
            (0, 0)
        } else {
            ((lo - cursor) as usize, (hi - cursor) as usize)
        }
    }
}
