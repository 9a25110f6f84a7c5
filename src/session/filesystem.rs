use super::storage::SessionStore;
use crate::error::Result;
use crate::models::Session;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const SESSIONS_FILE: &str = "sessions.json";

/// Keeps the session list as one JSON array on disk.
pub struct FilesystemSessionStore {
    path: PathBuf,
}

impl FilesystemSessionStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SESSIONS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }
}

impl SessionStore for FilesystemSessionStore {
    fn load(&self) -> Result<Vec<Session>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<Session>>(&content) {
            Ok(sessions) => Ok(sessions),
            Err(_) => {
                // Keep the unreadable list aside instead of overwriting it on the next save.
                fs::rename(&self.path, self.backup_path())?;
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, sessions: &[Session]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(sessions)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
