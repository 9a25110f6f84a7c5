mod filesystem;
mod memory;
mod storage;

pub use filesystem::FilesystemSessionStore;
pub use memory::MemorySessionStore;
pub use storage::SessionStore;

use crate::error::{Result, RunixError};
use crate::models::{Agent, Author, Message, Session};
use chrono::Utc;
use uuid::Uuid;

/// Title every session starts with until its first reply names it.
pub const DEFAULT_TITLE: &str = "New Chat";

const TITLE_MAX_CHARS: usize = 80;
const TITLE_MAX_WORDS: usize = 8;

/// Create a new, empty session with the default title
pub fn create_new_session(agent: Agent) -> Session {
    Session {
        id: Uuid::new_v4().to_string(),
        title: DEFAULT_TITLE.to_string(),
        created_at: Utc::now(),
        agent,
        messages: vec![],
    }
}

/// Title derived from a reply: newlines become spaces, then the text is cut
/// to 80 characters and finally to its first 8 words.
pub fn derive_title(reply: &str) -> Option<String> {
    let flattened = reply.replace(['\r', '\n'], " ");
    let clipped: String = flattened.chars().take(TITLE_MAX_CHARS).collect();
    let title = clipped
        .split_whitespace()
        .take(TITLE_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// The set of conversation threads plus a pointer to the active one.
///
/// Every mutation writes the whole list back through the store.
pub struct SessionManager {
    store: Box<dyn SessionStore>,
    sessions: Vec<Session>,
    active: Option<String>,
}

impl SessionManager {
    /// Load persisted sessions, selecting the first. An empty store gets a
    /// single default session.
    pub fn load(store: Box<dyn SessionStore>) -> Result<Self> {
        let sessions = store.load()?;
        let mut manager = Self {
            store,
            active: sessions.first().map(|s| s.id.clone()),
            sessions,
        };

        if manager.sessions.is_empty() {
            manager.create_session(Agent::default())?;
        }

        Ok(manager)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| RunixError::SessionError(format!("no session with id {}", id)))
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(RunixError::SessionError(format!("no session with id {}", id)));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    /// Start a new session at the front of the list and make it active.
    pub fn create_session(&mut self, agent: Agent) -> Result<String> {
        let session = create_new_session(agent);
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.active = Some(id.clone());
        self.persist()?;
        Ok(id)
    }

    /// The active session's id, creating a session first if none is active.
    pub fn ensure_active(&mut self, agent: Agent) -> Result<String> {
        match self.active() {
            Some(session) => Ok(session.id.clone()),
            None => self.create_session(agent),
        }
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RunixError::SessionError("title cannot be empty".to_string()));
        }
        self.get_mut(id)?.title = title.to_string();
        self.persist()
    }

    /// Remove a session. Deleting the active one falls back to the first
    /// remaining session, or to none.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return Err(RunixError::SessionError(format!("no session with id {}", id)));
        }

        if self.active.as_deref() == Some(id) {
            self.active = self.sessions.first().map(|s| s.id.clone());
        }
        self.persist()
    }

    /// Drop every session and start over with one default session.
    pub fn clear(&mut self) -> Result<()> {
        self.sessions.clear();
        self.active = None;
        self.create_session(Agent::default())?;
        Ok(())
    }

    pub fn append_message(
        &mut self,
        session_id: &str,
        author: Author,
        content: &str,
    ) -> Result<Message> {
        let session = self.get_mut(session_id)?;
        let message = Message::new(session.next_message_id(), author, content);
        session.messages.push(message.clone());
        self.persist()?;
        Ok(message)
    }

    /// Grow an in-progress reply. Not persisted until the reply is finalized.
    pub fn append_to_message(&mut self, session_id: &str, message_id: u64, delta: &str) -> Result<()> {
        let message = self
            .get_mut(session_id)?
            .message_mut(message_id)
            .ok_or_else(|| {
                RunixError::SessionError(format!("no message {} in session {}", message_id, session_id))
            })?;
        message.content.push_str(delta);
        Ok(())
    }

    /// Replace a reply with its final text, keeping its id and stamping a
    /// fresh timestamp.
    pub fn finalize_message(
        &mut self,
        session_id: &str,
        message_id: u64,
        content: &str,
    ) -> Result<Message> {
        let message = self
            .get_mut(session_id)?
            .message_mut(message_id)
            .ok_or_else(|| {
                RunixError::SessionError(format!("no message {} in session {}", message_id, session_id))
            })?;
        message.content = content.to_string();
        message.created_at = Utc::now();
        let finalized = message.clone();
        self.persist()?;
        Ok(finalized)
    }

    /// Name a still-untitled session after its first reply. Returns whether
    /// the title changed.
    pub fn auto_title(&mut self, session_id: &str, reply: &str) -> Result<bool> {
        let session = self.get_mut(session_id)?;
        if session.title != DEFAULT_TITLE {
            return Ok(false);
        }
        let Some(title) = derive_title(reply) else {
            return Ok(false);
        };
        session.title = title;
        self.persist()?;
        Ok(true)
    }

    /// Cut the session back to its last user message and return it, ready
    /// to be sent again.
    pub fn truncate_for_regenerate(&mut self, session_id: &str) -> Result<Option<Message>> {
        let session = self.get_mut(session_id)?;
        let Some(index) = session
            .messages
            .iter()
            .rposition(|m| m.author == Author::User)
        else {
            return Ok(None);
        };

        session.messages.truncate(index + 1);
        let last_user = session.messages[index].clone();
        self.persist()?;
        Ok(Some(last_user))
    }

    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_collapses_newlines() {
        assert_eq!(derive_title("Hi\nthere"), Some("Hi there".to_string()));
        assert_eq!(derive_title("\n\n"), None);
    }

    #[test]
    fn derive_title_limits_words() {
        let title = derive_title("one two three four five six seven eight nine ten").unwrap();
        assert_eq!(title, "one two three four five six seven eight");
    }

    #[test]
    fn derive_title_limits_chars_before_words() {
        let long_word = "x".repeat(100);
        let title = derive_title(&format!("{} tail", long_word)).unwrap();
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(!title.contains("tail"));
    }
}
