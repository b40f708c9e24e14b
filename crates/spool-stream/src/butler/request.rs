//! Request types for Butler thread communication.

/// Unique identifier for a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

impl ClientId {
    /// Generate a new unique client ID.
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(feature = "butler")]
pub(crate) use command::ButlerCommand;

#[cfg(feature = "butler")]
mod command {
    use super::ClientId;
    use crate::butler::ButlerClient;
    use crossbeam_channel::Sender;
    use std::sync::Arc;

    /// Command sent to the Butler thread
    pub(crate) enum ButlerCommand {
        /// Start invoking a client
        Register {
            id: ClientId,
            client: Arc<dyn ButlerClient>,
        },
        /// Stop invoking a client; `done` is signalled once it is removed
        Deregister {
            id: ClientId,
            done: Option<Sender<()>>,
        },
        /// Move a client to the front of the queue
        Prioritize(ClientId),
        /// Shutdown the butler thread
        Shutdown,
    }

    impl std::fmt::Debug for ButlerCommand {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ButlerCommand::Register { id, .. } => {
                    f.debug_struct("Register").field("id", id).finish()
                }
                ButlerCommand::Deregister { id, done } => f
                    .debug_struct("Deregister")
                    .field("id", id)
                    .field("wait", &done.is_some())
                    .finish(),
                ButlerCommand::Prioritize(id) => f.debug_tuple("Prioritize").field(id).finish(),
                ButlerCommand::Shutdown => write!(f, "Shutdown"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_generation() {
        let id1 = ClientId::generate();
        let id2 = ClientId::generate();
        let id3 = ClientId::generate();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}
