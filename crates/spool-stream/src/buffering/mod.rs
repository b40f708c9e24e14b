//! Look-ahead cache over a slow positionable source.
//!
//! [`BufferingSource`] keeps a window of upcoming audio in a fixed-capacity
//! wraparound cache. A background refill client, driven by any
//! [`Scheduler`], pulls bounded chunks from the source; the audio thread
//! copies from the cache and gets silence for anything not yet cached. It
//! never waits for the source.
//!
//! ```text
//!          refill (butler thread)                read (audio thread)
//! source ──────────────────────────▶ cache ──────────────────────────▶ block
//!          one chunk per time slice        [valid_start, valid_end)
//! ```

mod cache;
mod config;
mod metrics;
mod preroll;
mod read;
mod refill;
mod shared_state;

pub use config::{BufferConfig, MIN_BUFFER_SAMPLES};
pub use metrics::{StreamMetrics, StreamMetricsSnapshot};

use crate::butler::{ButlerClient, ClientId, Scheduler};
use crate::error::{Error, Result};
use crate::source::PositionableSource;
use cache::CacheStorage;
use parking_lot::Mutex;
use shared_state::SharedStreamState;
use spool_core::{AudioBuffer, BlockMut};
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sentinel for "no registered client".
const NO_CLIENT: u64 = u64::MAX;

/// Host configuration the cache is currently prepared for.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Prepared {
    sample_rate: f64,
    channels: usize,
    capacity: usize,
}

/// A positionable source fronted by a look-ahead cache.
///
/// Lifecycle and control calls (`configure`, `release`, `set_looping`,
/// `with_source`) may block and belong on a control thread. `read_block`,
/// `seek`, `position` and the other getters never wait on the source and
/// are safe on the audio thread.
pub struct BufferingSource {
    shared: Arc<SharedStreamState>,
    scheduler: Arc<dyn Scheduler>,
    lifecycle: Mutex<Option<Prepared>>,
    client: AtomicU64,
    /// Bumped by every configure and release; prefill loops watch it.
    epoch: AtomicU64,
    channels: usize,
}

impl BufferingSource {
    /// Wrap `source` with a cache of at least `buffer_samples` per channel.
    ///
    /// `buffer_samples` is raised to [`MIN_BUFFER_SAMPLES`].
    pub fn new<S>(source: S, scheduler: Arc<dyn Scheduler>, channels: usize, buffer_samples: usize) -> Self
    where
        S: PositionableSource + 'static,
    {
        Self::with_config(
            source,
            scheduler,
            channels,
            BufferConfig::with_buffer_samples(buffer_samples),
        )
    }

    pub fn with_config<S>(source: S, scheduler: Arc<dyn Scheduler>, channels: usize, config: BufferConfig) -> Self
    where
        S: PositionableSource + 'static,
    {
        Self {
            shared: Arc::new(SharedStreamState::new(Box::new(source), config)),
            scheduler,
            lifecycle: Mutex::new(None),
            client: AtomicU64::new(NO_CLIENT),
            epoch: AtomicU64::new(0),
            channels,
        }
    }

    /// Prepare for playback with the channel count and cache size given at
    /// construction.
    pub fn prepare_to_play(&self, block_size_hint: usize, sample_rate: f64) -> Result<()> {
        self.configure(
            block_size_hint,
            sample_rate,
            self.channels,
            self.shared.config.buffer_samples,
        )
    }

    /// Size the cache, prepare the source and start background refills.
    ///
    /// The cache holds `max(2 * block_size_hint, min_buffer_samples)`
    /// samples per channel. Calling again with an unchanged sample rate,
    /// channel count and capacity does nothing. Otherwise all cached content
    /// is discarded; the read cursor is kept.
    ///
    /// With prefill enabled this blocks until some look-ahead is cached, the
    /// source runs out, the prefill timeout passes, or another `configure`
    /// or `release` supersedes this one.
    pub fn configure(
        &self,
        block_size_hint: usize,
        sample_rate: f64,
        channels: usize,
        min_buffer_samples: usize,
    ) -> Result<()> {
        if block_size_hint == 0 {
            return Err(Error::InvalidConfig("block size must be greater than zero".into()));
        }
        if channels == 0 {
            return Err(Error::InvalidConfig("channel count must be greater than zero".into()));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!("invalid sample rate {}", sample_rate)));
        }
        self.shared.config.validate()?;

        let capacity = block_size_hint.saturating_mul(2).max(min_buffer_samples);
        if capacity.saturating_sub(self.shared.config.guard_samples) < block_size_hint {
            return Err(Error::BufferTooSmall {
                capacity,
                block_size: block_size_hint,
            });
        }
        let wanted = Prepared {
            sample_rate,
            channels,
            capacity,
        };

        let (id, epoch) = {
            let mut prepared = self.lifecycle.lock();
            if *prepared == Some(wanted) {
                return Ok(());
            }

            let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
            self.unregister();

            let (looping, total_length) = {
                let mut slot = self.shared.source.lock();
                slot.source.prepare(block_size_hint, sample_rate);
                slot.scratch.set_size(channels, self.shared.config.max_chunk_samples);
                (slot.source.is_looping(), slot.source.total_length())
            };
            self.shared.mirror_source_flags(looping, total_length);

            let storage = Arc::new(CacheStorage::new(channels, capacity));
            {
                let mut range = self.shared.range.lock();
                self.shared.storage.store(storage);
                range.invalidate();
                range.was_looping = looping;
            }

            let client: Arc<dyn ButlerClient> = self.shared.clone();
            let id = self.scheduler.register(client);
            self.client.store(id.0, Ordering::Release);
            *prepared = Some(wanted);

            tracing::debug!(capacity, channels, sample_rate, "Configured look-ahead cache");
            self.scheduler.prioritize(id);
            (id, epoch)
        };

        if self.shared.config.prefill {
            let target = self.shared.config.prefill_target(sample_rate, capacity);
            preroll::prefill(
                &self.shared,
                &*self.scheduler,
                id,
                target,
                &self.epoch,
                epoch,
                self.shared.config.prefill_timeout_ms,
            );
        }
        Ok(())
    }

    /// Stop background refills, free the cache and release the source.
    ///
    /// Reads afterwards produce silence until the next `configure`.
    /// Calling it again is harmless.
    pub fn release(&self) {
        let mut prepared = self.lifecycle.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.unregister();

        let empty = Arc::new(CacheStorage::empty());
        {
            let mut range = self.shared.range.lock();
            self.shared.storage.store(empty);
            range.invalidate();
        }

        if prepared.take().is_some() {
            let mut slot = self.shared.source.lock();
            slot.source.release();
            slot.scratch.set_size(0, 0);
            tracing::debug!("Released look-ahead cache");
        }
    }

    /// Fill `block` from the cache and advance the read cursor by its length.
    pub fn read_block(&self, block: &mut BlockMut<'_>) {
        read::read_block(&self.shared, block);
    }

    /// Fill all of `buffer` from the cache.
    pub fn read_into(&self, buffer: &mut AudioBuffer) {
        self.read_block(&mut buffer.as_block_mut());
    }

    /// Move the read cursor. Cached content outside the new look-ahead
    /// window is replaced by the background refill.
    pub fn seek(&self, position: i64) {
        self.shared.range.lock().next_read_pos = position;
        self.prioritize();
    }

    /// Read cursor, wrapped into the source length while looping.
    pub fn position(&self) -> i64 {
        let position = self.next_read_position();
        let total_length = self.shared.total_length();
        if self.shared.is_looping() && total_length > 0 && position > 0 {
            position % total_length
        } else {
            position
        }
    }

    /// Absolute read cursor, never wrapped.
    pub fn next_read_position(&self) -> i64 {
        self.shared.range.lock().next_read_pos
    }

    /// Source length as last observed; `<= 0` when unknown.
    pub fn total_length(&self) -> i64 {
        self.shared.total_length()
    }

    pub fn is_looping(&self) -> bool {
        self.shared.is_looping()
    }

    /// Change the source's looping mode and rebuild the cache.
    pub fn set_looping(&self, looping: bool) {
        self.with_source(|source| source.set_looping(looping));
        self.prioritize();
    }

    /// Run `f` with exclusive access to the source.
    ///
    /// Blocks while a refill is reading. Do not call from the audio thread.
    ///
    /// A change of looping mode discards the cache at once, so no block is
    /// served from content cached under the old mode.
    pub fn with_source<R>(&self, f: impl FnOnce(&mut dyn PositionableSource) -> R) -> R {
        let (result, looping) = {
            let mut slot = self.shared.source.lock();
            let result = f(slot.source.as_mut());
            let looping = slot.source.is_looping();
            self.shared
                .mirror_source_flags(looping, slot.source.total_length());
            (result, looping)
        };

        let mut range = self.shared.range.lock();
        if range.was_looping != looping {
            range.was_looping = looping;
            if !range.is_empty() {
                self.shared.metrics.record_discard();
            }
            range.invalidate();
            tracing::debug!(looping, "Looping changed, cache discarded");
        }
        result
    }

    /// Block until the next `block_size` samples are cached or `timeout_ms`
    /// passes. Returns whether the block is ready.
    ///
    /// Returns `true` at once when the block has nothing playable in it.
    /// A source of unknown length (`total_length() <= 0`) counts as
    /// unbounded, so the wait runs until the block is cached or times out.
    pub fn wait_until_ready(&self, block_size: usize, timeout_ms: u32) -> bool {
        preroll::wait_until_ready(&self.shared, block_size, timeout_ms)
    }

    pub fn metrics(&self) -> &StreamMetrics {
        &self.shared.metrics
    }

    pub fn config(&self) -> &BufferConfig {
        &self.shared.config
    }

    /// Cache capacity per channel; 0 while unconfigured.
    pub fn capacity(&self) -> usize {
        self.shared.storage.load().capacity()
    }

    /// Channel count of the current cache, or the constructor's count while
    /// unconfigured.
    pub fn num_channels(&self) -> usize {
        self.lifecycle
            .lock()
            .map_or(self.channels, |prepared| prepared.channels)
    }

    /// Absolute positions currently cached.
    pub fn valid_range(&self) -> Range<i64> {
        let range = self.shared.range.lock();
        range.valid_start..range.valid_end
    }

    pub fn is_prepared(&self) -> bool {
        self.lifecycle.lock().is_some()
    }

    /// Refill client id while configured.
    pub fn client_id(&self) -> Option<ClientId> {
        match self.client.load(Ordering::Acquire) {
            NO_CLIENT => None,
            id => Some(ClientId(id)),
        }
    }

    fn prioritize(&self) {
        if let Some(id) = self.client_id() {
            self.scheduler.prioritize(id);
        }
    }

    fn unregister(&self) {
        let id = self.client.swap(NO_CLIENT, Ordering::AcqRel);
        if id != NO_CLIENT {
            self.scheduler.deregister(ClientId(id));
        }
    }
}

impl Drop for BufferingSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for BufferingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferingSource")
            .field("capacity", &self.capacity())
            .field("valid_range", &self.valid_range())
            .field("next_read_position", &self.next_read_position())
            .field("looping", &self.is_looping())
            .finish()
    }
}
