//! Look-ahead streaming for slow audio sources.
//!
//! Wraps a seekable source that may block (disk, network, decoder) in a
//! cache that a background thread keeps filled ahead of the playback
//! cursor, so the audio thread can read without waiting on I/O.
//!
//! # Features
//!
//! - **Buffering**: wraparound look-ahead cache with drift-triggered refills
//! - **Butler**: one background thread servicing any number of caches
//! - **Preroll**: bounded waits for cached audio before starting playback
//!
//! # Example
//!
//! ```ignore
//! use spool_stream::{Butler, BufferingSource, MemorySource};
//! use std::sync::Arc;
//!
//! let butler = Arc::new(Butler::new()?);
//! let stream = BufferingSource::new(MemorySource::mono(samples), butler, 1, 32768);
//! stream.prepare_to_play(512, 48000.0)?;
//!
//! // Audio thread
//! stream.read_into(&mut block);
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

pub mod buffering;
pub mod butler;
pub mod source;

pub use buffering::{
    BufferConfig, BufferingSource, StreamMetrics, StreamMetricsSnapshot, MIN_BUFFER_SAMPLES,
};
#[cfg(feature = "butler")]
pub use butler::{Butler, ButlerStats};
pub use butler::{ButlerClient, ButlerConfig, ClientId, Scheduler};
pub use source::{MemorySource, PositionableSource};

pub use spool_core::{AudioBuffer, BlockMut};
