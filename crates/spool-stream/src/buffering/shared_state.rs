//! State shared between the refill client and the audio thread.

use super::cache::{CacheStorage, RangeState};
use super::config::BufferConfig;
use super::metrics::StreamMetrics;
use super::preroll::ReadySignal;
use super::refill;
use crate::butler::ButlerClient;
use crate::source::PositionableSource;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use spool_core::AudioBuffer;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Source plus the scratch buffer refills decode into.
pub(crate) struct SourceSlot {
    pub source: Box<dyn PositionableSource>,
    pub scratch: AudioBuffer,
}

/// Everything the background refill and the audio thread both touch.
///
/// Lock order: the range lock and the source lock are never held together.
/// The audio thread only takes the range lock, and only for a bounded copy.
pub(crate) struct SharedStreamState {
    pub config: BufferConfig,
    pub storage: ArcSwap<CacheStorage>,
    pub range: Mutex<RangeState>,
    pub source: Mutex<SourceSlot>,
    pub ready: ReadySignal,
    /// Mirrors of the source's flags, readable without the source lock.
    pub looping: AtomicBool,
    pub total_length: AtomicI64,
    pub metrics: StreamMetrics,
}

impl SharedStreamState {
    pub fn new(source: Box<dyn PositionableSource>, config: BufferConfig) -> Self {
        let looping = source.is_looping();
        let total_length = source.total_length();
        Self {
            config,
            storage: ArcSwap::from_pointee(CacheStorage::empty()),
            range: Mutex::new(RangeState {
                was_looping: looping,
                ..Default::default()
            }),
            source: Mutex::new(SourceSlot {
                source,
                scratch: AudioBuffer::default(),
            }),
            ready: ReadySignal::new(),
            looping: AtomicBool::new(looping),
            total_length: AtomicI64::new(total_length),
            metrics: StreamMetrics::new(),
        }
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Acquire)
    }

    #[inline]
    pub fn total_length(&self) -> i64 {
        self.total_length.load(Ordering::Acquire)
    }

    pub fn mirror_source_flags(&self, looping: bool, total_length: i64) {
        self.looping.store(looping, Ordering::Release);
        self.total_length.store(total_length, Ordering::Release);
    }
}

impl ButlerClient for SharedStreamState {
    fn use_time_slice(&self) -> u32 {
        refill::refill_next_chunk(self)
    }
}
