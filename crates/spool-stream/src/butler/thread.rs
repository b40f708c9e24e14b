//! Butler thread: a single background worker multiplexing time-slice clients.

use super::config::ButlerConfig;
use super::{ButlerClient, ButlerCommand, ClientId, Scheduler};
use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use thread_priority::ThreadPriority;

/// Background thread that repeatedly invokes registered clients.
///
/// Clients are served earliest-due first; a client returning a delay of
/// zero is due again immediately but goes to the back of the queue, so
/// busy clients share the thread round-robin.
pub struct Butler {
    command_tx: Sender<ButlerCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
    shutdown: Arc<AtomicBool>,
    stats: Arc<ButlerStats>,
}

impl Butler {
    /// Spawn a butler thread with default configuration.
    pub fn new() -> Result<Self> {
        Self::spawn(ButlerConfig::default())
    }

    /// Spawn a butler thread with custom configuration.
    pub fn spawn(config: ButlerConfig) -> Result<Self> {
        let (tx, rx) = bounded(config.command_capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(ButlerStats::default());

        let thread_shutdown = Arc::clone(&shutdown);
        let thread_stats = Arc::clone(&stats);
        let elevated_priority = config.elevated_priority;

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                if elevated_priority {
                    if let Err(e) =
                        thread_priority::set_current_thread_priority(ThreadPriority::Max)
                    {
                        tracing::debug!("Butler thread priority unchanged: {:?}", e);
                    }
                }

                butler_loop(rx, thread_shutdown, thread_stats);
            })?;

        tracing::debug!("Butler thread '{}' started", config.thread_name);

        Ok(Self {
            command_tx: tx,
            thread_id: handle.thread().id(),
            thread_handle: Mutex::new(Some(handle)),
            shutdown,
            stats,
        })
    }

    /// Counters for the worker loop.
    pub fn stats(&self) -> Arc<ButlerStats> {
        Arc::clone(&self.stats)
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Registered clients are dropped. Later calls are no-ops.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.command_tx.send(ButlerCommand::Shutdown);

        if self.on_butler_thread() {
            return;
        }

        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }

    fn on_butler_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Drop for Butler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Scheduler for Butler {
    fn register(&self, client: Arc<dyn ButlerClient>) -> ClientId {
        let id = ClientId::generate();
        if self
            .command_tx
            .send(ButlerCommand::Register { id, client })
            .is_err()
        {
            tracing::warn!("Butler stopped, client {:?} will not be serviced", id);
        }
        id
    }

    fn deregister(&self, id: ClientId) {
        // A client removing itself from inside its own time slice can't wait
        // for the loop that is running it.
        if self.on_butler_thread() {
            let _ = self
                .command_tx
                .send(ButlerCommand::Deregister { id, done: None });
            return;
        }

        let (done_tx, done_rx) = bounded(1);
        if self
            .command_tx
            .send(ButlerCommand::Deregister {
                id,
                done: Some(done_tx),
            })
            .is_ok()
        {
            // Errors once the loop exits and drops the pending command.
            let _ = done_rx.recv();
        }
    }

    fn prioritize(&self, id: ClientId) {
        let _ = self.command_tx.try_send(ButlerCommand::Prioritize(id));
    }
}

/// Worker loop counters.
#[derive(Debug, Default)]
pub struct ButlerStats {
    slices_run: AtomicU64,
    registered_clients: AtomicUsize,
}

impl ButlerStats {
    /// Total client invocations.
    pub fn slices_run(&self) -> u64 {
        self.slices_run.load(Ordering::Relaxed)
    }

    pub fn registered_clients(&self) -> usize {
        self.registered_clients.load(Ordering::Relaxed)
    }
}

struct ClientEntry {
    id: ClientId,
    client: Arc<dyn ButlerClient>,
    next_due: Instant,
}

/// Butler thread main loop.
fn butler_loop(rx: Receiver<ButlerCommand>, shutdown: Arc<AtomicBool>, stats: Arc<ButlerStats>) {
    let mut clients: VecDeque<ClientEntry> = VecDeque::new();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        if !process_commands(&rx, &mut clients, &stats) {
            break;
        }

        let now = Instant::now();

        let keep_running = match next_due(&clients) {
            None => match rx.recv() {
                Ok(cmd) => handle_command(cmd, &mut clients, &stats),
                Err(_) => false,
            },
            Some(index) if clients[index].next_due > now => {
                match rx.recv_timeout(clients[index].next_due - now) {
                    Ok(cmd) => handle_command(cmd, &mut clients, &stats),
                    Err(RecvTimeoutError::Timeout) => true,
                    Err(RecvTimeoutError::Disconnected) => false,
                }
            }
            Some(index) => {
                run_slice(&mut clients, index, &stats);
                true
            }
        };

        if !keep_running {
            break;
        }
    }

    stats.registered_clients.store(0, Ordering::Relaxed);
    tracing::debug!("Butler thread exiting with {} clients", clients.len());
}

/// Drain pending commands. Returns false when the loop should exit.
fn process_commands(
    rx: &Receiver<ButlerCommand>,
    clients: &mut VecDeque<ClientEntry>,
    stats: &ButlerStats,
) -> bool {
    loop {
        match rx.try_recv() {
            Ok(cmd) => {
                if !handle_command(cmd, clients, stats) {
                    return false;
                }
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

/// Handle a single butler command. Returns false on shutdown.
fn handle_command(
    cmd: ButlerCommand,
    clients: &mut VecDeque<ClientEntry>,
    stats: &ButlerStats,
) -> bool {
    match cmd {
        ButlerCommand::Register { id, client } => {
            clients.push_back(ClientEntry {
                id,
                client,
                next_due: Instant::now(),
            });
            tracing::trace!("Butler registered client {:?}", id);
        }
        ButlerCommand::Deregister { id, done } => {
            clients.retain(|entry| entry.id != id);
            stats
                .registered_clients
                .store(clients.len(), Ordering::Relaxed);
            if let Some(done) = done {
                let _ = done.send(());
            }
            tracing::trace!("Butler deregistered client {:?}", id);
        }
        ButlerCommand::Prioritize(id) => move_to_front(clients, id),
        ButlerCommand::Shutdown => return false,
    }

    stats
        .registered_clients
        .store(clients.len(), Ordering::Relaxed);
    true
}

fn move_to_front(clients: &mut VecDeque<ClientEntry>, id: ClientId) {
    let Some(index) = clients.iter().position(|entry| entry.id == id) else {
        return;
    };
    let Some(mut entry) = clients.remove(index) else {
        return;
    };

    let now = Instant::now();
    entry.next_due = clients
        .iter()
        .map(|other| other.next_due)
        .min()
        .map_or(now, |earliest| earliest.min(now));
    clients.push_front(entry);
}

/// Earliest-due client; ties go to the one nearest the front.
fn next_due(clients: &VecDeque<ClientEntry>) -> Option<usize> {
    clients
        .iter()
        .enumerate()
        .min_by_key(|(_, entry)| entry.next_due)
        .map(|(index, _)| index)
}

fn run_slice(clients: &mut VecDeque<ClientEntry>, index: usize, stats: &ButlerStats) {
    let Some(mut entry) = clients.remove(index) else {
        return;
    };

    let delay_ms = entry.client.use_time_slice();
    stats.slices_run.fetch_add(1, Ordering::Relaxed);

    entry.next_due = Instant::now() + Duration::from_millis(u64::from(delay_ms));
    clients.push_back(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::butler::ASAP;
    use std::sync::atomic::AtomicU32;

    struct CountingClient {
        calls: AtomicU32,
        delay_ms: u32,
    }

    impl CountingClient {
        fn new(delay_ms: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                delay_ms,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ButlerClient for CountingClient {
        fn use_time_slice(&self) -> u32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.delay_ms
        }
    }

    fn test_butler() -> Butler {
        Butler::spawn(ButlerConfig {
            elevated_priority: false,
            ..ButlerConfig::with_thread_name("spool-butler-test")
        })
        .unwrap()
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        condition()
    }

    #[test]
    fn test_registered_client_is_invoked() {
        let butler = test_butler();
        let client = CountingClient::new(ASAP);
        butler.register(client.clone());

        assert!(wait_for(|| client.calls() >= 10));
        assert!(butler.stats().slices_run() >= 10);
    }

    #[test]
    fn test_deregister_stops_invocations() {
        let butler = test_butler();
        let client = CountingClient::new(1);
        let id = butler.register(client.clone());

        assert!(wait_for(|| client.calls() >= 2));
        butler.deregister(id);

        let after = client.calls();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(client.calls(), after);
        assert!(wait_for(|| butler.stats().registered_clients() == 0));
    }

    #[test]
    fn test_idle_delay_is_respected() {
        let butler = test_butler();
        let client = CountingClient::new(10_000);
        butler.register(client.clone());

        assert!(wait_for(|| client.calls() == 1));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn test_prioritize_wakes_idle_client() {
        let butler = test_butler();
        let client = CountingClient::new(10_000);
        let id = butler.register(client.clone());

        assert!(wait_for(|| client.calls() == 1));
        butler.prioritize(id);
        assert!(wait_for(|| client.calls() == 2));
    }

    #[test]
    fn test_busy_clients_share_the_thread() {
        let butler = test_butler();
        let a = CountingClient::new(ASAP);
        let b = CountingClient::new(ASAP);
        butler.register(a.clone());
        butler.register(b.clone());

        assert!(wait_for(|| a.calls() >= 50 && b.calls() >= 50));
    }

    #[test]
    fn test_deregister_unknown_id_returns() {
        let butler = test_butler();
        butler.deregister(ClientId(u64::MAX));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let butler = test_butler();
        let client = CountingClient::new(ASAP);
        let id = butler.register(client.clone());

        butler.shutdown();
        assert!(!butler.is_running());
        butler.shutdown();

        // Commands after shutdown neither block nor panic.
        butler.prioritize(id);
        butler.deregister(id);
        let _ = butler.register(CountingClient::new(1));
    }

    #[test]
    fn test_move_to_front_beats_overdue_clients() {
        let now = Instant::now();
        let mut clients: VecDeque<ClientEntry> = VecDeque::new();
        for i in 0..3u64 {
            clients.push_back(ClientEntry {
                id: ClientId(100 + i),
                client: CountingClient::new(0),
                next_due: now - Duration::from_millis(10 * (3 - i)),
            });
        }

        move_to_front(&mut clients, ClientId(102));
        assert_eq!(next_due(&clients), Some(0));
        assert_eq!(clients[0].id, ClientId(102));
    }
}
