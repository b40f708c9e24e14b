//! Builder for configuring and constructing a `SpoolEngine`.

use crate::stream::Scheduler;
use crate::{Result, SpoolEngine};
use std::sync::Arc;

#[cfg(feature = "butler")]
use crate::stream::{Butler, ButlerConfig};

/// With the `butler` feature a background thread is spawned by `build()`
/// unless a scheduler is supplied. Without it, `scheduler()` is required.
///
/// # Example
///
/// ```ignore
/// use spool::prelude::*;
///
/// let engine = SpoolEngine::builder()
///     .thread_name("disk-io")
///     .build()?;
/// ```
#[derive(Default)]
pub struct SpoolEngineBuilder {
    scheduler: Option<Arc<dyn Scheduler>>,

    #[cfg(feature = "butler")]
    butler_config: ButlerConfig,
}

impl SpoolEngineBuilder {
    /// Drive streams with an existing scheduler instead of a new thread.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Default: "spool-butler"
    #[cfg(feature = "butler")]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.butler_config.thread_name = name.into();
        self
    }

    /// Default: 256
    #[cfg(feature = "butler")]
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.butler_config.command_capacity = capacity;
        self
    }

    /// Default: true
    #[cfg(feature = "butler")]
    pub fn elevated_priority(mut self, elevated: bool) -> Self {
        self.butler_config.elevated_priority = elevated;
        self
    }

    pub fn build(self) -> Result<SpoolEngine> {
        if let Some(scheduler) = self.scheduler {
            return Ok(SpoolEngine::with_scheduler(scheduler));
        }

        #[cfg(feature = "butler")]
        {
            let butler = Butler::spawn(self.butler_config)?;
            Ok(SpoolEngine::from_butler(Arc::new(butler)))
        }

        #[cfg(not(feature = "butler"))]
        {
            Err(crate::Error::NoScheduler)
        }
    }
}
