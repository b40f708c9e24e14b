//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The look-ahead window after the guard is shorter than one block.
    #[error("Buffer too small: capacity {capacity} leaves no room for a block of {block_size} samples")]
    BufferTooSmall { capacity: usize, block_size: usize },

    /// Source failed to produce or position audio.
    #[error("Source error: {0}")]
    Source(String),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
