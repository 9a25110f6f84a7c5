use super::storage::SessionStore;
use crate::error::{Result, RunixError};
use crate::models::Session;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-process store. Clones share the same list, so a caller can keep a
/// handle after boxing one into a `SessionManager`.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<Vec<Session>>>,
    saves: Arc<AtomicUsize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of whole-list writes so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions
            .lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Vec<Session>> {
        self.sessions
            .lock()
            .map(|sessions| sessions.clone())
            .map_err(|_| RunixError::SessionError("session store lock poisoned".to_string()))
    }

    fn save(&self, sessions: &[Session]) -> Result<()> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RunixError::SessionError("session store lock poisoned".to_string()))?;
        *guard = sessions.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
