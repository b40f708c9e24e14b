//! SpoolEngine: one background scheduler shared by many look-ahead streams.

use crate::builders::StreamBuilder;
use crate::stream::{PositionableSource, Scheduler};
use std::sync::Arc;

#[cfg(feature = "butler")]
use crate::stream::{Butler, ButlerStats};

/// Owns the scheduler every stream it creates registers with.
///
/// With the `butler` feature the engine spawns a [`Butler`] thread unless a
/// custom scheduler is supplied. The thread stops when the engine and every
/// stream holding the scheduler are dropped.
///
/// # Example
///
/// ```ignore
/// use spool::prelude::*;
///
/// let engine = SpoolEngine::builder().build()?;
/// let stream = engine
///     .stream(MemorySource::mono(samples))
///     .channels(1)
///     .prepare(512, 48000.0)
///     .build()?;
///
/// // Audio thread
/// stream.read_into(&mut block);
/// ```
pub struct SpoolEngine {
    scheduler: Arc<dyn Scheduler>,
    #[cfg(feature = "butler")]
    butler: Option<Arc<Butler>>,
}

impl SpoolEngine {
    pub fn builder() -> crate::SpoolEngineBuilder {
        crate::SpoolEngineBuilder::default()
    }

    #[cfg(feature = "butler")]
    pub(crate) fn from_butler(butler: Arc<Butler>) -> Self {
        Self {
            scheduler: butler.clone(),
            butler: Some(butler),
        }
    }

    /// Engine driving streams with a caller-provided scheduler.
    pub fn with_scheduler(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            #[cfg(feature = "butler")]
            butler: None,
        }
    }

    /// Start building a look-ahead stream over `source`.
    pub fn stream<S>(&self, source: S) -> StreamBuilder<'_>
    where
        S: PositionableSource + 'static,
    {
        StreamBuilder::new(self, Box::new(source))
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Worker counters of the engine's own butler thread.
    ///
    /// `None` when the engine runs on a custom scheduler.
    #[cfg(feature = "butler")]
    pub fn butler_stats(&self) -> Option<Arc<ButlerStats>> {
        self.butler.as_ref().map(|butler| butler.stats())
    }
}

impl std::fmt::Debug for SpoolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        #[allow(unused_mut)]
        let mut debug = f.debug_struct("SpoolEngine");
        #[cfg(feature = "butler")]
        debug.field("butler", &self.butler.is_some());
        debug.finish_non_exhaustive()
    }
}
