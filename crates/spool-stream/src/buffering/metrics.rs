//! Refill and read-path counters for a look-ahead cache.
//!
//! Every counter is a relaxed atomic so the audio thread can record misses
//! without blocking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the refill and read paths.
#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Samples per channel pulled from the source
    samples_buffered: AtomicU64,
    /// Refill invocations that committed new data
    refills: AtomicU64,
    /// Full cache discards (seek, loop-mode change)
    discards: AtomicU64,
    /// Source reads or seeks that failed
    source_errors: AtomicU64,
    /// Blocks served to the audio thread
    blocks_read: AtomicU64,
    /// Blocks partly filled with silence
    partial_misses: AtomicU64,
    /// Blocks entirely filled with silence
    total_misses: AtomicU64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_refill(&self, samples: u64) {
        self.samples_buffered.fetch_add(samples, Ordering::Relaxed);
        self.refills.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_discard(&self) {
        self.discards.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_source_error(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_block(&self) {
        self.blocks_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_partial_miss(&self) {
        self.partial_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_total_miss(&self) {
        self.total_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current metrics.
    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            samples_buffered: self.samples_buffered.load(Ordering::Relaxed),
            refills: self.refills.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
            source_errors: self.source_errors.load(Ordering::Relaxed),
            blocks_read: self.blocks_read.load(Ordering::Relaxed),
            partial_misses: self.partial_misses.load(Ordering::Relaxed),
            total_misses: self.total_misses.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.samples_buffered.store(0, Ordering::Relaxed);
        self.refills.store(0, Ordering::Relaxed);
        self.discards.store(0, Ordering::Relaxed);
        self.source_errors.store(0, Ordering::Relaxed);
        self.blocks_read.store(0, Ordering::Relaxed);
        self.partial_misses.store(0, Ordering::Relaxed);
        self.total_misses.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of stream metrics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMetricsSnapshot {
    pub samples_buffered: u64,
    pub refills: u64,
    pub discards: u64,
    pub source_errors: u64,
    pub blocks_read: u64,
    pub partial_misses: u64,
    pub total_misses: u64,
}

impl StreamMetricsSnapshot {
    /// Fraction of blocks that needed any silence substitution (0.0 - 1.0).
    ///
    /// Returns 0.0 if no blocks have been read.
    pub fn miss_rate(&self) -> f32 {
        if self.blocks_read == 0 {
            0.0
        } else {
            (self.partial_misses + self.total_misses) as f32 / self.blocks_read as f32
        }
    }

    /// Average samples per committed refill.
    pub fn avg_refill_size(&self) -> u64 {
        if self.refills == 0 {
            0
        } else {
            self.samples_buffered / self.refills
        }
    }
}
