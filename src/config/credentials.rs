use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

const API_KEY_FILE: &str = "api_key";

fn key_path(data_dir: &Path) -> PathBuf {
    data_dir.join(API_KEY_FILE)
}

/// Read the persisted API key, if one was saved.
pub fn load_api_key(data_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(key_path(data_dir)).ok()?;
    let key = content.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Persist the API key next to the session list, separate from it.
pub fn save_api_key(data_dir: &Path, key: &str) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let path = key_path(data_dir);
    fs::write(&path, key.trim())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_trimmed_key() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_api_key(dir.path()), None);

        save_api_key(dir.path(), "  sk-test-123\n").unwrap();
        assert_eq!(load_api_key(dir.path()), Some("sk-test-123".to_string()));
    }
}
