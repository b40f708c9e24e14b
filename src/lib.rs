//! # Spool - Look-ahead Audio Streaming
//!
//! Keeps slow audio sources (disk, network, decoders) cached ahead of the
//! playback cursor so a real-time audio thread never waits on I/O.
//!
//! ## Architecture
//!
//! Spool is an umbrella crate that coordinates:
//! - **spool-core** - Buffers, block views, wraparound addressing, wrap-safe clock
//! - **spool-stream** - Sources, the Butler scheduler, and the look-ahead cache
//!
//! ## Quick Start
//!
//! ```ignore
//! use spool::prelude::*;
//!
//! let engine = SpoolEngine::builder().build()?;
//!
//! let stream = engine
//!     .stream(MemorySource::mono(samples))
//!     .channels(1)
//!     .prepare(512, 48000.0)
//!     .build()?;
//!
//! // Audio thread: never blocks, silence where nothing is cached yet
//! stream.read_into(&mut block);
//!
//! // Control thread
//! stream.seek(48000);
//! stream.wait_until_ready(512, 500);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Butler thread
//! - `butler` - Background scheduler thread (otherwise supply your own `Scheduler`)

/// Re-export of spool-core for direct access
pub use spool_core as core;

/// Re-export of spool-stream for direct access
pub use spool_stream as stream;

// Core types
pub use spool_core::{AudioBuffer, BlockMut};

// Streaming
pub use spool_stream::{
    BufferConfig, BufferingSource, ButlerClient, ButlerConfig, ClientId, MemorySource,
    PositionableSource, Scheduler, StreamMetrics, StreamMetricsSnapshot,
};

#[cfg(feature = "butler")]
pub use spool_stream::Butler;

pub mod error;
pub use error::{Error, Result};

mod builder;
mod builders;
mod engine;

pub use builder::SpoolEngineBuilder;
pub use builders::StreamBuilder;
pub use engine::SpoolEngine;

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{SpoolEngine, SpoolEngineBuilder, StreamBuilder};

    // Essential types
    pub use crate::core::{AudioBuffer, BlockMut};

    // Streaming
    pub use crate::stream::{BufferConfig, BufferingSource, MemorySource, PositionableSource};

    // Scheduling
    pub use crate::stream::{ButlerClient, Scheduler};

    #[cfg(feature = "butler")]
    pub use crate::stream::Butler;

    // Error handling
    pub use crate::{Error, Result};
}
