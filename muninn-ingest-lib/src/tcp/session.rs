//! Server-side bookkeeping for one tracker connection, plus the concurrent
//! registry the idle sweeper walks.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Notify;
use tracing::info;

use crate::telemetry::TraceContext;

pub type SessionId = u64;

pub struct Session {
    pub remote_addr: SocketAddr,
    pub trace: TraceContext,
    epoch: Instant,
    last_active_ms: AtomicU64,
    close: Notify,
}

impl Session {
    fn new(remote_addr: SocketAddr, epoch: Instant) -> Self {
        let session = Self {
            remote_addr,
            trace: TraceContext::generate(),
            epoch,
            last_active_ms: AtomicU64::new(0),
            close: Notify::new(),
        };
        session.touch();
        session
    }

    /// Marks the session active now. Called on open and on every frame.
    pub fn touch(&self) {
        self.last_active_ms.store(self.epoch.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    pub fn idle_for(&self) -> Duration {
        let now = self.epoch.elapsed().as_millis() as u64;
        Duration::from_millis(now.saturating_sub(self.last_active_ms.load(Ordering::Relaxed)))
    }

    /// Asks the owning connection task to shut the socket down. The permit
    /// is stored, so a task not currently waiting still observes it.
    pub fn close(&self) {
        self.close.notify_one();
    }

    pub async fn closed(&self) {
        self.close.notified().await;
    }
}

/// Concurrent map from connection identity to session state. The only state
/// shared across connection tasks.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    next_id: AtomicU64,
    epoch: Instant,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self { sessions: DashMap::new(), next_id: AtomicU64::new(1), epoch: Instant::now() }
    }

    pub fn open(&self, remote_addr: SocketAddr) -> (SessionId, Arc<Session>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(remote_addr, self.epoch));
        self.sessions.insert(id, session.clone());
        (id, session)
    }

    /// A `None` here means the session was already evicted or closed;
    /// callers must treat that as a request to close the connection.
    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|s| s.value().clone())
    }

    pub fn remove(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.remove(&id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Closes and removes every session idle longer than `idle`. Returns how
    /// many were evicted.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        // Collect first: removing while iterating would deadlock a shard.
        let stale: Vec<(SessionId, Arc<Session>)> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() > idle)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (id, session) in &stale {
            info!(
                trace_id = %session.trace.trace_id,
                addr = %session.remote_addr,
                idle = ?session.idle_for(),
                "closing inactive connection"
            );
            session.close();
            self.sessions.remove(id);
        }
        stale.len()
    }

    /// Signals every connection task to stop. Entries are removed by each
    /// task's guard as it exits.
    pub fn close_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().close();
        }
    }
}

/// Removes the session when the connection task ends, panicking or not.
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: SessionId,
}

impl SessionGuard {
    pub fn new(registry: Arc<SessionRegistry>, id: SessionId) -> Self {
        Self { registry, id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.registry.remove(self.id) {
            info!(
                trace_id = %session.trace.trace_id,
                addr = %session.remote_addr,
                "client disconnected"
            );
        }
    }
}
