//! Fluent builder for look-ahead streams.
//!
//! # Example
//!
//! ```ignore
//! let stream = engine
//!     .stream(source)
//!     .channels(2)
//!     .buffer_samples(65536)
//!     .prefill(false)
//!     .prepare(512, 48000.0)
//!     .build()?;
//! ```

use crate::stream::{BufferConfig, BufferingSource, PositionableSource, MIN_BUFFER_SAMPLES};
use crate::{Result, SpoolEngine};

/// Fluent builder for a [`BufferingSource`].
///
/// Created via `engine.stream(source)`. The stream registers with the
/// engine's scheduler when it is prepared, either by `build()` when
/// [`prepare`](Self::prepare) was called or later via `prepare_to_play`.
pub struct StreamBuilder<'a> {
    engine: &'a SpoolEngine,
    source: Box<dyn PositionableSource>,
    channels: usize,
    config: BufferConfig,
    prepare: Option<(usize, f64)>,
}

impl<'a> StreamBuilder<'a> {
    pub(crate) fn new(engine: &'a SpoolEngine, source: Box<dyn PositionableSource>) -> Self {
        Self {
            engine,
            source,
            channels: 2,
            config: BufferConfig::default(),
            prepare: None,
        }
    }

    /// Default: 2
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Minimum cache size per channel, raised to 1024.
    ///
    /// Default: 32768
    pub fn buffer_samples(mut self, samples: usize) -> Self {
        self.config.buffer_samples = samples.max(MIN_BUFFER_SAMPLES);
        self
    }

    /// Block preparation until look-ahead is cached.
    ///
    /// Default: true
    pub fn prefill(mut self, prefill: bool) -> Self {
        self.config.prefill = prefill;
        self
    }

    /// Most samples pulled from the source per background invocation.
    ///
    /// Default: 2048
    pub fn max_chunk_samples(mut self, samples: usize) -> Self {
        self.config.max_chunk_samples = samples;
        self
    }

    /// Replace the whole refill configuration.
    pub fn config(mut self, config: BufferConfig) -> Self {
        self.config = config;
        self
    }

    /// Prepare for playback as part of `build()`.
    pub fn prepare(mut self, block_size_hint: usize, sample_rate: f64) -> Self {
        self.prepare = Some((block_size_hint, sample_rate));
        self
    }

    pub fn build(self) -> Result<BufferingSource> {
        let stream = BufferingSource::with_config(
            self.source,
            self.engine.scheduler().clone(),
            self.channels,
            self.config,
        );

        if let Some((block_size_hint, sample_rate)) = self.prepare {
            stream.prepare_to_play(block_size_hint, sample_rate)?;
        }
        Ok(stream)
    }
}
