//! Centralized error type for the spool umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream: {0}")]
    Stream(#[from] spool_stream::Error),

    /// No scheduler was supplied and the butler feature is disabled.
    #[error("No scheduler available; supply one with SpoolEngineBuilder::scheduler")]
    NoScheduler,
}

pub type Result<T> = std::result::Result<T, Error>;
