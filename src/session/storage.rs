use crate::error::Result;
use crate::models::Session;

/// Whole-list persistence for chat sessions.
///
/// Implementations never apply partial updates: `save` replaces everything
/// `load` would return.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Vec<Session>>;

    fn save(&self, sessions: &[Session]) -> Result<()>;
}
