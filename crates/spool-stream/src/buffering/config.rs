//! Look-ahead cache configuration.

use crate::error::{Error, Result};

/// Smallest cache size accepted from [`BufferConfig::with_buffer_samples`].
pub const MIN_BUFFER_SAMPLES: usize = 1024;

/// Refill policy and preroll tuning for a look-ahead cache.
///
/// None of these values affect correctness; they trade latency of a single
/// background invocation against how quickly the cache catches up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferConfig {
    /// Minimum cache size per channel used by `prepare_to_play` (default: 32768)
    pub buffer_samples: usize,
    /// Samples kept free at the tail of the look-ahead window (default: 4)
    pub guard_samples: usize,
    /// Boundary movement that triggers a refill (default: 512)
    pub drift_threshold: usize,
    /// Most samples read from the source per invocation (default: 2048)
    pub max_chunk_samples: usize,
    /// Re-invocation delay when there is nothing to do (default: 100ms)
    pub idle_poll_ms: u32,
    /// Block `configure` until some look-ahead is cached (default: true)
    pub prefill: bool,
    /// Look-ahead to prefill, in seconds; capped at half the cache (default: 0.25)
    pub prefill_seconds: f64,
    /// Give up prefilling after this long (default: 2000ms)
    pub prefill_timeout_ms: u32,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            buffer_samples: 32768,
            guard_samples: 4,
            drift_threshold: 512,
            max_chunk_samples: 2048,
            idle_poll_ms: 100,
            prefill: true,
            prefill_seconds: 0.25,
            prefill_timeout_ms: 2000,
        }
    }
}

impl BufferConfig {
    /// Create config with a custom cache size.
    pub fn with_buffer_samples(samples: usize) -> Self {
        Self {
            buffer_samples: samples.max(MIN_BUFFER_SAMPLES),
            ..Default::default()
        }
    }

    /// Same config without prefilling.
    pub fn without_prefill(self) -> Self {
        Self {
            prefill: false,
            ..self
        }
    }

    /// Samples of look-ahead `configure` waits for when prefilling.
    pub fn prefill_target(&self, sample_rate: f64, capacity: usize) -> usize {
        let wanted = (sample_rate * self.prefill_seconds).max(0.0) as usize;
        wanted.min(capacity / 2)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_samples == 0 {
            return Err(Error::InvalidConfig(
                "max_chunk_samples must be greater than zero".into(),
            ));
        }
        if !self.prefill_seconds.is_finite() || self.prefill_seconds < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "prefill_seconds must be finite and non-negative, got {}",
                self.prefill_seconds
            )));
        }
        Ok(())
    }
}
