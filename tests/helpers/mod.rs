//! Test helpers and fixtures for spool integration tests
//!
//! Sources here produce a ramp (sample `i` has value `i`), so any block read
//! back from a cache can be checked against the position it claims to be.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Samples copied through the cache
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

pub mod tolerances;

use approx::abs_diff_eq;
use spool::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tolerances::{FLOAT_EPSILON, SILENCE_THRESHOLD};

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard block size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Readiness timeout generous enough for loaded CI machines.
pub const READY_TIMEOUT_MS: u32 = 5000;

/// Route `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine with its own butler thread at normal priority.
#[cfg(feature = "butler")]
pub fn test_engine() -> SpoolEngine {
    init_tracing();
    SpoolEngine::builder()
        .thread_name("spool-test-butler")
        .elevated_priority(false)
        .build()
        .expect("Failed to create test engine")
}

/// Sample `i` has value `i`.
pub fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32).collect()
}

pub fn ramp_source(len: usize) -> MemorySource {
    MemorySource::mono(ramp(len))
}

/// Left channel ramps up, right channel is its negation.
pub fn stereo_ramp_source(len: usize) -> MemorySource {
    let left = ramp(len);
    let right = left.iter().map(|s| -s).collect();
    MemorySource::new(AudioBuffer::from_channels(vec![left, right]))
}

/// Value a ramp of `len` samples has at absolute `position`.
pub fn expected_ramp(position: i64, len: usize, looping: bool) -> f32 {
    let len = len as i64;
    if looping && len > 0 {
        position.rem_euclid(len) as f32
    } else if (0..len).contains(&position) {
        position as f32
    } else {
        0.0
    }
}

/// Assert that `block` is the ramp starting at absolute `start`.
pub fn assert_ramp_block(block: &[f32], start: i64, len: usize, looping: bool) {
    for (i, &sample) in block.iter().enumerate() {
        let position = start + i as i64;
        let expected = expected_ramp(position, len, looping);
        assert!(
            abs_diff_eq!(sample, expected, epsilon = FLOAT_EPSILON),
            "position {}: got {}, expected {}",
            position,
            sample,
            expected
        );
    }
}

pub fn is_silent(samples: &[f32]) -> bool {
    samples.iter().all(|s| s.abs() < SILENCE_THRESHOLD)
}

/// Source that sleeps before every read, like a cold disk.
pub struct SlowSource {
    inner: MemorySource,
    delay: Duration,
    reads: Arc<AtomicUsize>,
}

impl SlowSource {
    pub fn new(inner: MemorySource, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of completed reads.
    pub fn reads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

impl PositionableSource for SlowSource {
    fn prepare(&mut self, block_size_hint: usize, sample_rate: f64) {
        self.inner.prepare(block_size_hint, sample_rate);
    }

    fn release(&mut self) {
        self.inner.release();
    }

    fn read(&mut self, block: &mut BlockMut<'_>) -> spool::stream::Result<()> {
        std::thread::sleep(self.delay);
        self.inner.read(block)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn seek(&mut self, position: i64) -> spool::stream::Result<()> {
        self.inner.seek(position)
    }

    fn position(&self) -> i64 {
        self.inner.position()
    }

    fn total_length(&self) -> i64 {
        self.inner.total_length()
    }

    fn is_looping(&self) -> bool {
        self.inner.is_looping()
    }

    fn set_looping(&mut self, looping: bool) {
        self.inner.set_looping(looping);
    }
}
