//! Shared server state: the pipeline and the live sessions.

use architect_agent::{Pipeline, Session};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A session shared between requests. Holding the lock serializes questions
/// on that session.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<SharedState>,
}

struct SharedState {
    pipeline: Pipeline,
    max_sessions: usize,
    sessions: RwLock<SessionTable>,
}

/// Live sessions with a use counter for least-recently-used eviction.
#[derive(Default)]
struct SessionTable {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

struct SessionEntry {
    handle: SessionHandle,
    last_used: u64,
}

impl SessionTable {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, id: &str) -> Option<SessionHandle> {
        let now = self.tick();
        let entry = self.entries.get_mut(id)?;
        entry.last_used = now;
        Some(entry.handle.clone())
    }

    fn least_recently_used(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| id.clone())
    }
}

impl AppState {
    /// State holding at most `max_sessions` sessions (at least one).
    pub fn new(pipeline: Pipeline, max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(SharedState {
                pipeline,
                max_sessions: max_sessions.max(1),
                sessions: RwLock::new(SessionTable::default()),
            }),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// The session named `id`, or a new one when `id` is absent or unknown.
    ///
    /// Creating a session when the table is full evicts the least recently
    /// used one. A request already holding the evicted handle still finishes.
    pub async fn session(&self, id: Option<&str>) -> SessionHandle {
        let mut table = self.inner.sessions.write().await;

        if let Some(id) = id {
            if let Some(handle) = table.touch(id) {
                return handle;
            }
            tracing::debug!(requested = id, "Unknown session id, starting a new session");
        }

        while table.entries.len() >= self.inner.max_sessions {
            let Some(evicted) = table.least_recently_used() else {
                break;
            };
            table.entries.remove(&evicted);
            tracing::info!(session = %evicted, "Session evicted");
        }

        let session = self.inner.pipeline.new_session();
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        let last_used = table.tick();
        table.entries.insert(
            id.clone(),
            SessionEntry {
                handle: handle.clone(),
                last_used,
            },
        );

        tracing::info!(session = %id, "Session created");
        handle
    }

    /// Forget a session. Returns false if it did not exist.
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = self.inner.sessions.write().await.entries.remove(id).is_some();
        if removed {
            tracing::info!(session = id, "Session removed");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.entries.len()
    }

    pub fn max_sessions(&self) -> usize {
        self.inner.max_sessions
    }
}
