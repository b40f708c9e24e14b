//! Cooperative background scheduling for slow, bounded units of work.
//!
//! Clients register once and are invoked repeatedly; each invocation does a
//! bounded amount of work and returns how long the scheduler may wait before
//! calling it again. The [`Butler`] is a single background thread that
//! multiplexes any number of clients, never running one client concurrently
//! with itself.

mod config;
mod request;
#[cfg(feature = "butler")]
mod thread;

pub use config::ButlerConfig;
pub use request::ClientId;
#[cfg(feature = "butler")]
pub use thread::{Butler, ButlerStats};

#[cfg(feature = "butler")]
pub(crate) use request::ButlerCommand;

use std::sync::Arc;

/// Delay hint meaning "call again as soon as possible".
pub const ASAP: u32 = 0;

/// A unit of background work driven by a [`Scheduler`].
pub trait ButlerClient: Send + Sync {
    /// Do a bounded amount of work.
    ///
    /// Returns the suggested delay in milliseconds before the next call,
    /// or [`ASAP`].
    fn use_time_slice(&self) -> u32;
}

/// Service that repeatedly invokes registered [`ButlerClient`]s.
pub trait Scheduler: Send + Sync {
    /// Start servicing `client`.
    fn register(&self, client: Arc<dyn ButlerClient>) -> ClientId;

    /// Stop servicing a client.
    ///
    /// Returns once the client is not running and will not be invoked again.
    /// Unknown ids are ignored.
    fn deregister(&self, id: ClientId);

    /// Move a client to the front of the service queue.
    ///
    /// Never blocks; safe to call from the audio thread.
    fn prioritize(&self, id: ClientId);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn register(&self, client: Arc<dyn ButlerClient>) -> ClientId {
        (**self).register(client)
    }

    fn deregister(&self, id: ClientId) {
        (**self).deregister(id)
    }

    fn prioritize(&self, id: ClientId) {
        (**self).prioritize(id)
    }
}
