//! Butler thread configuration.

/// Configuration for the butler thread.
#[derive(Debug, Clone)]
pub struct ButlerConfig {
    /// Worker thread name (default: "spool-butler")
    pub thread_name: String,
    /// Command queue capacity (default: 256)
    /// `prioritize` drops requests while the queue is full.
    pub command_capacity: usize,
    /// Raise the worker to maximum thread priority (default: true)
    pub elevated_priority: bool,
}

impl Default for ButlerConfig {
    fn default() -> Self {
        Self {
            thread_name: "spool-butler".into(),
            command_capacity: 256,
            elevated_priority: true,
        }
    }
}

impl ButlerConfig {
    /// Create config with a custom thread name.
    pub fn with_thread_name(name: impl Into<String>) -> Self {
        Self {
            thread_name: name.into(),
            ..Default::default()
        }
    }
}
